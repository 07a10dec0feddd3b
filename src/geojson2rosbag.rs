use std::path::{Path, PathBuf};
use std::process::exit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{error, info, warn};

use rosbag_geojson::{
    args::{validate_paths, DatumArgs, Verbosity},
    assembler,
    export::TopicMessage,
    geojson::FeatureCollection,
    ros::RosTools,
    Error, Projector, Result,
};

const POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Parser)]
/// Publish a GeoJSON map and record it into a new ROS bag
struct Args {
    /// Input GeoJSON file
    input: PathBuf,
    /// Output bag file (.bag)
    output: PathBuf,
    /// Dry run :
    /// print the message bodies instead of recording them
    #[clap(long)]
    dry_run: bool,
    /// Settle time :
    /// seconds to give the recorder before publishing
    #[clap(long, default_value = "2")]
    settle_secs: u64,
    /// Overwrite :
    /// if specified, will overwrite the output file if it already exists
    #[clap(short, long)]
    overwrite: bool,
    #[clap(flatten)]
    datum: DatumArgs,
    #[clap(flatten)]
    verbosity: Verbosity,
}

fn main() {
    let Args {
        input,
        output,
        dry_run,
        settle_secs,
        overwrite,
        datum,
        verbosity,
    } = Args::parse();
    verbosity.handle_verbose();
    validate_paths(&input, (!dry_run).then_some(output.as_path()), overwrite);

    let datum = datum.resolve();
    let projector = match Projector::new(datum) {
        Ok(ok) => ok,
        Err(err) => {
            error!("Couldn't use datum : {}", err);
            exit(1);
        }
    };

    let collection: FeatureCollection = match std::fs::read_to_string(&input)
        .map_err(Error::from)
        .and_then(|text| Ok(serde_json::from_str::<FeatureCollection>(&text)?))
    {
        Ok(ok) => ok,
        Err(err) => {
            error!("Couldn't parse GeoJSON : {}", err);
            exit(1);
        }
    };
    info!(
        "Read {} feature(s) from {:?}, datum {}",
        collection.features.len(),
        input,
        datum
    );

    let decomposed = match assembler::decompose(&collection, &projector) {
        Ok(ok) => ok,
        Err(err) => {
            error!("Conversion failed : {}", err);
            exit(1);
        }
    };

    if dry_run {
        for message in &decomposed.messages {
            println!("# {} ({})", message.topic.name, message.topic.message_type);
            print!("{}", message.body());
        }
        return;
    }
    if decomposed.messages.is_empty() {
        error!("Nothing to publish, no bag written");
        exit(1);
    }

    if let Err(err) = record(&decomposed.messages, &output, Duration::from_secs(settle_secs)) {
        error!("Couldn't create bag : {}", err);
        exit(1);
    }
    info!("Created bag file: {:?}", output);
}

/// Records `messages` into `output` by publishing them while `rosbag record`
/// runs. Ctrl-C aborts, the recorder is stopped either way.
fn record(messages: &[TopicMessage], output: &Path, settle: Duration) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    if let Err(err) = ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst)) {
        warn!("Couldn't install Ctrl-C handler : {}", err);
    }

    let dir = tempfile::tempdir()?;
    let mut files = Vec::with_capacity(messages.len());
    for message in messages {
        let path = dir
            .path()
            .join(format!("{}.yaml", message.topic.name.trim_start_matches('/')));
        let body = message.body();
        log::debug!("{} :\n{}", message.topic.name, body);
        std::fs::write(&path, body)?;
        files.push((message.topic, path));
    }

    let tools = RosTools::default();
    let topics: Vec<_> = messages.iter().map(|message| message.topic).collect();
    let mut recorder = tools.record(output, &topics)?;
    wait(settle, &running)?;
    recorder.check()?;

    for (topic, path) in &files {
        if !running.load(Ordering::SeqCst) {
            return Err(Error::Interrupted);
        }
        tools.publish(*topic, path)?;
        info!("Published {}", topic.name);
    }

    wait(Duration::from_secs(1), &running)?;
    recorder.stop()
}

fn wait(duration: Duration, running: &AtomicBool) -> Result<()> {
    let start = Instant::now();
    while start.elapsed() < duration {
        if !running.load(Ordering::SeqCst) {
            return Err(Error::Interrupted);
        }
        thread::sleep(POLL.min(duration.saturating_sub(start.elapsed())));
    }
    Ok(())
}
