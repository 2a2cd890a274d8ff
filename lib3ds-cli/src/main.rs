use anyhow::*;
use std::result::Result::Ok;
use log::*;
use structopt::StructOpt;

use std::fs;
use std::path::{Path, PathBuf};

mod cube;
mod descriptor;
mod dump;
mod obj;

use descriptor::Config;

#[derive(Debug, StructOpt)]
#[structopt(name = "lib3ds", about = "inspects, converts and builds 3ds files")]
struct Opt {
    /// Log level: 0 error, 1 warn, 2 info, 3 debug, 4 trace. `RUST_LOG` wins when set.
    #[structopt(short, long, default_value = "1")]
    debug: u8,

    /// Configuration file, `lib3ds.toml` in the working directory by default
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Print the content of a 3ds file
    Dump(dump::DumpOpt),
    /// Convert a 3ds file to Wavefront OBJ
    Obj {
        #[structopt(parse(from_os_str))]
        input: PathBuf,
        #[structopt(parse(from_os_str))]
        obj: Option<PathBuf>,
        #[structopt(parse(from_os_str))]
        mtl: Option<PathBuf>,
    },
    /// Write the textured cube demo scene
    Cube {
        #[structopt(parse(from_os_str))]
        output: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Config {
    let path = path.unwrap_or_else(|| Path::new("lib3ds.toml"));
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(_) => {
            debug!("no config at {}", path.display());
            return Config::default();
        }
    };
    match toml::from_str(&data) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to parse config file: {}", e);
            Config::default()
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    let level = match opt.debug {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = load_config(opt.config.as_deref());
    debug!("{:?}", config);

    match opt.cmd {
        Command::Dump(dump) => dump::run(&dump),
        Command::Obj { input, obj, mtl } => {
            let obj = obj.unwrap_or_else(|| input.with_extension("obj"));
            let mtl = mtl.unwrap_or_else(|| obj.with_extension("mtl"));
            obj::run(&config, &input, &obj, &mtl)
        }
        Command::Cube { output } => {
            let file = cube::scene()?;
            file.save(&output)
                .with_context(|| format!("failed to save {}", output.display()))?;
            info!("wrote {}", output.display());
            Ok(())
        }
    }
}
