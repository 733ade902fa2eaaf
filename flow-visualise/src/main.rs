//! Render dense optical flow of a video into a colour-coded video.

use anyhow::{Context, Result};
use clap::*;
use flowvis::prelude::v1::{
    CancelToken, FlowParams, FourCc, LogProgress, PipelineMode, ProgressObserver,
};
use flowvis::Error as FlowError;
use flowvis_cv::VisualiseOptions;
use log::{debug, error, info, warn};
use std::fmt::Display;
use std::str::FromStr;

mod progress;

use progress::ConsoleProgress;

/// Everything a run needs, parsed from the command line.
#[derive(Debug)]
struct Settings {
    input: String,
    output: String,
    options: VisualiseOptions,
    quiet: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        match e.downcast_ref::<FlowError>() {
            Some(flow_err) => {
                error!("{} failed: {e:#}", flow_err.stage());
                eprintln!("error: {} failed: {e:#}", flow_err.stage());
                std::process::exit(flow_err.exit_code());
            }
            None => {
                error!("{e:#}");
                eprintln!("error: {e:#}");
                std::process::exit(1);
            }
        }
    }
}

fn run() -> Result<()> {
    let matches = command().get_matches();
    let settings = settings(&matches)?;

    {
        let cancel = settings.options.cancel.clone();
        ctrlc::set_handler(move || {
            warn!("Interrupted, stopping after the current frame");
            cancel.cancel();
        })
        .context("failed to install the interrupt handler")?;
    }

    let mut progress: Box<dyn ProgressObserver> = if settings.quiet {
        Box::new(LogProgress::default())
    } else {
        Box::new(ConsoleProgress::default())
    };

    let summary = flowvis_cv::visualise(
        &settings.input,
        &settings.output,
        &settings.options,
        &mut *progress,
    )
    .with_context(|| format!("visualising {}", settings.input))?;

    // Finish the progress bar before logging the summary.
    drop(progress);

    info!(
        "Wrote {} frames to {} ({}x{} @ {} fps)",
        summary.frames_written,
        settings.output,
        summary.metadata.width,
        summary.metadata.height,
        summary.metadata.frame_rate
    );

    Ok(())
}

fn command() -> Command<'static> {
    Command::new("flow-visualise")
        .version(crate_version!())
        .author(crate_authors!())
        .about("Optical flow processing on a video")
        .arg(
            Arg::new("input_video")
                .help("Path to the input video file")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .takes_value(true)
                .default_value("output.mp4")
                .help("Path to the output video file"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .takes_value(true)
                .help("JSON file with flow parameters"),
        )
        .arg(knob("pyr-scale", "Image scale between pyramid layers"))
        .arg(knob("levels", "Number of pyramid layers"))
        .arg(knob("win-size", "Averaging window size"))
        .arg(knob("iterations", "Iterations at each pyramid level"))
        .arg(knob("poly-n", "Polynomial expansion neighbourhood (5 or 7)"))
        .arg(knob("poly-sigma", "Polynomial expansion smoothing"))
        .arg(
            Arg::new("fourcc")
                .long("fourcc")
                .takes_value(true)
                .default_value("mp4v")
                .help("Codec of the output video"),
        )
        .arg(
            Arg::new("buffered")
                .long("buffered")
                .help("Process the whole video before writing any output"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Do not draw a progress bar"),
        )
}

fn knob(name: &'static str, help: &'static str) -> Arg<'static> {
    Arg::new(name).long(name).takes_value(true).help(help)
}

fn settings(matches: &ArgMatches) -> Result<Settings> {
    let mut params = match matches.value_of("config") {
        Some(path) => load_params(path)?,
        None => FlowParams::default(),
    };

    override_knob(matches, "pyr-scale", &mut params.pyr_scale)?;
    override_knob(matches, "levels", &mut params.levels)?;
    override_knob(matches, "win-size", &mut params.win_size)?;
    override_knob(matches, "iterations", &mut params.iterations)?;
    override_knob(matches, "poly-n", &mut params.poly_n)?;
    override_knob(matches, "poly-sigma", &mut params.poly_sigma)?;

    params.validate()?;

    let fourcc: FourCc = matches.value_of("fourcc").unwrap_or("mp4v").parse()?;

    let mode = if matches.is_present("buffered") {
        PipelineMode::Buffered
    } else {
        PipelineMode::Streaming
    };

    Ok(Settings {
        input: matches
            .value_of("input_video")
            .context("missing input video")?
            .to_string(),
        output: matches.value_of("output").unwrap_or("output.mp4").to_string(),
        options: VisualiseOptions {
            params,
            fourcc,
            mode,
            cancel: CancelToken::new(),
        },
        quiet: matches.is_present("quiet"),
    })
}

fn load_params(path: &str) -> Result<FlowParams> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| FlowError::Config(format!("cannot read {path}: {e}")))?;
    let params = serde_json::from_str(&data)
        .map_err(|e| FlowError::Config(format!("cannot parse {path}: {e}")))?;
    debug!("Loaded {params:?} from {path}");
    Ok(params)
}

fn override_knob<T>(matches: &ArgMatches, name: &str, knob: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: Display,
{
    if let Some(val) = matches.value_of(name) {
        *knob = val
            .parse()
            .map_err(|e| FlowError::Config(format!("--{name} {val}: {e}")))?;
    }
    Ok(())
}
