use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    process::exit,
};

use clap::Parser;
use log::{error, info, warn};

use rosbag_geojson::{
    args::{validate_paths, DatumArgs, Verbosity},
    assembler,
    parser::{self, ParsedDump},
    ros::RosTools,
    topics, Projector,
};

#[derive(Debug, Parser)]
/// Convert the map recorded in a ROS bag to GeoJSON
struct Args {
    /// Input bag file (.bag), or a text dump with --dump
    input: PathBuf,
    /// Output file (.geojson)
    output: PathBuf,
    /// Dump :
    /// read the input as already rendered message text instead of asking rostopic
    #[clap(long)]
    dump: bool,
    /// Overwrite :
    /// if specified, will overwrite the output file if it already exists
    #[clap(short, long)]
    overwrite: bool,
    #[clap(flatten)]
    datum: DatumArgs,
    #[clap(flatten)]
    verbosity: Verbosity,
}

impl std::fmt::Display for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Args:\n\tinput: {:?}\n\toutput: {:?}\n\tdump: {}", self.input, self.output, self.dump)
    }
}

fn read_bag(input: &Path) -> ParsedDump {
    let tools = RosTools::default();
    match tools.info(input) {
        Ok(summary) => log::debug!("Bag info :\n{}", summary),
        Err(err) => warn!("Couldn't read bag info : {}", err),
    }

    let mut parsed = ParsedDump::default();
    for topic in topics::ALL {
        match tools.echo(input, topic) {
            Ok(text) => {
                log::debug!("{} output :\n{}", topic.name, text);
                parsed.extend(parser::parse_topic(topic, &text));
            }
            Err(err) => warn!("Skipping {} : {}", topic.name, err),
        }
    }
    parsed
}

fn main() {
    let args = Args::parse();
    args.verbosity.handle_verbose();
    log::debug!("{}", args);
    validate_paths(&args.input, Some(args.output.as_path()), args.overwrite);

    let datum = args.datum.resolve();
    let projector = match Projector::new(datum) {
        Ok(ok) => ok,
        Err(err) => {
            error!("Couldn't use datum : {}", err);
            exit(1);
        }
    };
    info!("Converting {:?} to GeoJSON around datum {}", args.input, datum);

    let parsed = if args.dump {
        match std::fs::read_to_string(&args.input) {
            Ok(text) => parser::parse(text.lines()),
            Err(err) => {
                error!("Couldn't read dump : {}", err);
                exit(1);
            }
        }
    } else {
        read_bag(&args.input)
    };

    let assembly = match assembler::assemble(&parsed.blocks, &projector) {
        Ok(ok) => ok,
        Err(err) => {
            error!("Conversion failed : {}", err);
            exit(1);
        }
    };
    let patched = parsed.diagnostics.len() + assembly.diagnostics.len();
    if patched > 0 {
        warn!("{} problem(s) were worked around, see warnings above", patched);
    }

    let mut file = match File::create(&args.output) {
        Ok(ok) => BufWriter::new(ok),
        Err(err) => {
            error!("Couldn't create output file : {}", err);
            exit(1);
        }
    };
    let written = serde_json::to_writer_pretty(&mut file, &assembly.collection)
        .map_err(rosbag_geojson::Error::from)
        .and_then(|_| Ok(file.flush()?));
    if let Err(err) = written {
        error!("Couldn't write GeoJSON : {}", err);
        exit(1);
    }

    info!(
        "Wrote {} feature(s) to {:?}",
        assembly.collection.features.len(),
        args.output
    );
}
