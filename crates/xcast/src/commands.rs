use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use clap::ArgMatches;
use serde_json::json;
use tracing::{error, info, warn};

use xcast_core::catalog::{CatalogEntry, Discovery, WindowFilter};
use xcast_core::display::DisplayError;
use xcast_core::events;
use xcast_core::ffmpeg::{
    CaptureError, CaptureFields, CaptureSpec, OutputSize, SourceRect, compile_capture_with,
    ffmpeg_version, screenshot_spec,
};
use xcast_core::process::{CaptureProcess, OutputMode, OutputTail, ProcessState, Supervisor};
use xcast_core::session::{StreamSession, StreamSettings, StreamSource};
use xcast_core::v4l2::{self, LoopbackDevice};
use xcast_core::{ScreenId, ThumbnailPipeline, WindowId, WindowSystem, XcastConfig};

use crate::table;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

const STREAM_POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run_command(matches: &ArgMatches) -> CommandResult {
    events::log_app_startup();

    let result = match matches.subcommand() {
        Some(("list", sub_matches)) => handle_list_command(sub_matches),
        Some(("screenshot", sub_matches)) => handle_screenshot_command(sub_matches),
        Some(("preview", sub_matches)) => handle_preview_command(sub_matches),
        Some(("stream", sub_matches)) => handle_stream_command(sub_matches),
        Some(("thumbs", sub_matches)) => handle_thumbs_command(sub_matches),
        Some(("devices", sub_matches)) => handle_devices_command(sub_matches),
        Some(("status", sub_matches)) => handle_status_command(sub_matches),
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    };

    events::log_app_shutdown();
    result
}

/// Load configuration, falling back to defaults on errors.
///
/// The user is told on stderr, and `cli.config.load_failed` is logged.
fn load_config_with_warning() -> XcastConfig {
    match XcastConfig::load_hierarchy() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Could not load config: {}. Using defaults.\n\
                 Tip: Check ~/.xcast/config.toml and ./.xcast/config.toml for syntax errors.",
                e
            );
            warn!(
                event = "cli.config.load_failed",
                error = %e,
                "Config load failed, using defaults"
            );
            XcastConfig::default()
        }
    }
}

/// Open the displays named with `--display`, or probe from `:0`.
fn discover(matches: &ArgMatches) -> Discovery {
    match matches.get_many::<String>("display") {
        Some(names) => {
            let names: Vec<&String> = names.collect();
            Discovery::connect(&names)
        }
        None => Discovery::probe(),
    }
}

/// Open just the display that serves `screen`.
fn discover_screen(screen: &ScreenId) -> Result<Discovery, DisplayError> {
    let discovery = Discovery::connect(&[screen.display_name()]);
    if discovery.is_empty() {
        return Err(DisplayError::DisplayUnavailable {
            name: screen.display_name().to_string(),
            message: "could not connect".to_string(),
        });
    }
    Ok(discovery)
}

fn parse_window_id(value: &str) -> Result<WindowId, CaptureError> {
    value
        .parse()
        .map_err(|_| CaptureError::invalid("window", format!("must be a window id, got '{}'", value)))
}

fn parse_size(matches: &ArgMatches) -> Result<Option<OutputSize>, CaptureError> {
    matches
        .get_one::<String>("size")
        .map(|size| size.parse())
        .transpose()
}

fn report_failure(what: &str, event: &'static str, e: &dyn std::error::Error) {
    eprintln!("Failed to {}: {}", what, e);
    error!(event = event, error = %e);
    events::log_app_error(e);
}

fn handle_list_command(matches: &ArgMatches) -> CommandResult {
    match matches.subcommand() {
        Some(("screens", sub_matches)) => handle_list_screens(sub_matches),
        Some(("windows", sub_matches)) => handle_list_windows(sub_matches),
        _ => {
            error!(event = "cli.list_subcommand_unknown");
            Err("Unknown list subcommand".into())
        }
    }
}

fn handle_list_screens(matches: &ArgMatches) -> CommandResult {
    let json_output = matches.get_flag("json");
    info!(event = "cli.list_screens_started", json_output = json_output);

    let discovery = discover(matches);
    let screens = discovery.screens();

    if json_output {
        let screens: Vec<_> = screens.values().collect();
        println!("{}", serde_json::to_string_pretty(&screens)?);
    } else if screens.is_empty() {
        println!("No displays found.");
    } else {
        println!("Screens:");
        table::print_screens_table(&screens);
    }

    info!(event = "cli.list_screens_completed", count = screens.len());
    Ok(())
}

fn handle_list_windows(matches: &ArgMatches) -> CommandResult {
    let json_output = matches.get_flag("json");
    let config = load_config_with_warning();
    let min_size = matches
        .get_one::<u32>("min-size")
        .copied()
        .unwrap_or(config.catalog.min_window_size);
    let filter = WindowFilter::new(min_size);
    let screen_filter = matches.get_one::<String>("screen").map(|s| ScreenId::from(s.as_str()));

    info!(
        event = "cli.list_windows_started",
        json_output = json_output,
        screen = ?screen_filter,
        min_size = min_size
    );

    let discovery = match &screen_filter {
        Some(screen) => match discover_screen(screen) {
            Ok(discovery) => discovery,
            Err(e) => {
                report_failure("list windows", "cli.list_windows_failed", &e);
                return Err(e.into());
            }
        },
        None => discover(matches),
    };

    let screens: Vec<ScreenId> = match screen_filter {
        Some(screen) => vec![screen],
        None => discovery.screens().into_keys().collect(),
    };

    let mut entries: Vec<CatalogEntry> = Vec::new();
    for screen in &screens {
        match discovery.windows(screen, filter) {
            Ok(walk) => entries.extend(walk),
            Err(e) => {
                report_failure("list windows", "cli.list_windows_failed", &e);
                return Err(e.into());
            }
        }
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("No capturable windows found.");
    } else {
        println!("Capturable windows:");
        table::print_windows_table(&entries);
    }

    info!(event = "cli.list_windows_completed", count = entries.len());
    Ok(())
}

fn handle_screenshot_command(matches: &ArgMatches) -> CommandResult {
    let config = load_config_with_warning();
    let screen = ScreenId::from(required(matches, "screen")?);
    let output = PathBuf::from(required(matches, "output")?);
    let size = parse_size(matches)?;

    info!(
        event = "cli.screenshot_started",
        screen = %screen,
        output = %output.display()
    );

    let spec = match matches.get_one::<String>("window") {
        Some(window) => {
            let window = parse_window_id(window)?;
            let entry = match discover_screen(&screen)
                .and_then(|discovery| discovery.find_window(&screen, window))
            {
                Ok(entry) => entry,
                Err(e) => {
                    report_failure("find window", "cli.screenshot_failed", &e);
                    return Err(e.into());
                }
            };
            screenshot_spec(&screen, entry.geometry, &output, size)
        }
        None => {
            let rect: SourceRect = required(matches, "rect")?.parse()?;
            CaptureSpec::new(screen.clone(), rect, &output)
                .with_size(size)
                .with_pad(false)
        }
    };

    let command = compile_capture_with(&spec, &config.capture_settings())?;
    let result = CaptureProcess::spawn(&command, OutputMode::Capture)
        .and_then(|mut process| process.wait_success());

    match result {
        Ok(()) => {
            println!("Screenshot saved: {}", output.display());
            info!(event = "cli.screenshot_completed", output = %output.display());
            Ok(())
        }
        Err(e) => {
            report_failure("take screenshot", "cli.screenshot_failed", &e);
            Err(e.into())
        }
    }
}

fn handle_preview_command(matches: &ArgMatches) -> CommandResult {
    let config = load_config_with_warning();
    let rect = required(matches, "rect")?;
    let parts: Vec<&str> = rect.split(',').collect();
    let &[x, y, width, height] = parts.as_slice() else {
        return Err(
            CaptureError::invalid("rect", format!("must be X,Y,W,H, got '{}'", rect)).into(),
        );
    };
    let (output_width, output_height) = match matches.get_one::<String>("size") {
        Some(size) => size.split_once(['x', 'X']).ok_or_else(|| {
            CaptureError::invalid("size", format!("must be WxH, got '{}'", size))
        })?,
        None => ("", ""),
    };

    let fields = CaptureFields {
        screen: required(matches, "screen")?,
        x,
        y,
        width,
        height,
        output: required(matches, "output")?,
        output_width,
        output_height,
        fps: required(matches, "fps")?,
        scale: !matches.get_flag("no-scale"),
        pad: !matches.get_flag("no-pad"),
    };

    let command = CaptureSpec::from_fields(&fields)
        .and_then(|spec| compile_capture_with(&spec, &config.capture_settings()));
    match command {
        Ok(command) => {
            if matches.get_flag("json") {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "program": command.program,
                        "args": command.args,
                    }))?
                );
            } else {
                println!("{}", command);
            }
            info!(event = "cli.preview_completed", tokens = command.args.len() + 1);
            Ok(())
        }
        Err(e) => {
            report_failure("compile command", "cli.preview_failed", &e);
            Err(e.into())
        }
    }
}

fn handle_stream_command(matches: &ArgMatches) -> CommandResult {
    let config = load_config_with_warning();
    let screen = ScreenId::from(required(matches, "screen")?);
    let window = parse_window_id(required(matches, "window")?)?;
    let device = PathBuf::from(required(matches, "device")?);
    let duration = matches.get_one::<u64>("duration").copied().map(Duration::from_secs);

    let mut settings = StreamSettings::from(&config.stream);
    if let Some(fps) = matches.get_one::<u32>("fps") {
        settings.fps = *fps;
    }
    settings.size = parse_size(matches)?;

    info!(
        event = "cli.stream_started",
        screen = %screen,
        window_id = %window,
        device = %device.display(),
        fps = settings.fps
    );

    let entry = match discover_screen(&screen)
        .and_then(|discovery| discovery.find_window(&screen, window))
    {
        Ok(entry) => entry,
        Err(e) => {
            report_failure("find window", "cli.stream_failed", &e);
            return Err(e.into());
        }
    };

    let session = StreamSession::new(device_for(&device), settings, config.capture_settings())
        .with_source(StreamSource {
            screen: screen.clone(),
            window: Some(window),
            geometry: entry.geometry,
        });

    let supervisor = Supervisor::new();
    let pid = match session.start(&supervisor) {
        Ok(pid) => pid,
        Err(e) => {
            report_failure("start stream", "cli.stream_failed", &e);
            return Err(e.into());
        }
    };
    println!(
        "Streaming '{}' ({}) to {} (pid {})",
        entry.window.title_or_empty(),
        window,
        device.display(),
        pid
    );

    let started = Instant::now();
    let mut stderr = OutputTail::default();
    let (state, stopped_by_us) = loop {
        if let Ok(drained) = supervisor.drain_output(&session.slot()) {
            stderr.push(&drained.stderr);
        }
        match session.state(&supervisor) {
            Some(ProcessState::Running) | None => {}
            Some(exited) => break (exited, false),
        }
        if duration.is_some_and(|limit| started.elapsed() >= limit) {
            let state = session
                .stop(&supervisor)?
                .unwrap_or(ProcessState::Exited { code: None });
            break (state, true);
        }
        thread::sleep(STREAM_POLL_INTERVAL);
    };
    if let Ok(drained) = supervisor.drain_output(&session.slot()) {
        stderr.push(&drained.stderr);
    }

    if stream_ended_cleanly(state, stopped_by_us) {
        println!("Stream stopped after {}s", started.elapsed().as_secs());
        info!(event = "cli.stream_completed", state = %state);
        Ok(())
    } else {
        let message = String::from_utf8_lossy(&stderr.contents()).trim_end().to_string();
        eprintln!("Stream ended unexpectedly ({}): {}", state, message);
        error!(event = "cli.stream_failed", state = %state, stderr = %message);
        Err(format!("ffmpeg {}", state).into())
    }
}

/// ffmpeg exits 255 when it handles SIGTERM, so after a stop we asked for
/// any exit counts as clean.
fn stream_ended_cleanly(state: ProcessState, stopped_by_us: bool) -> bool {
    match state {
        ProcessState::Running => false,
        ProcessState::Exited { code } => stopped_by_us || code == Some(0),
    }
}

/// The configured device at `path`, or an unlabelled one if it is not listed.
fn device_for(path: &Path) -> LoopbackDevice {
    v4l2::list_devices()
        .ok()
        .and_then(|devices| devices.into_iter().find(|device| device.path == path))
        .unwrap_or_else(|| LoopbackDevice {
            label: path.display().to_string(),
            path: path.to_path_buf(),
        })
}

fn handle_thumbs_command(matches: &ArgMatches) -> CommandResult {
    let json_output = matches.get_flag("json");
    let config = load_config_with_warning();

    let mut settings = config.thumbnail_settings();
    if let Some(concurrency) = matches.get_one::<usize>("concurrency") {
        settings.concurrency = *concurrency;
    }
    if let Some(cache_dir) = matches.get_one::<String>("cache-dir") {
        settings.cache_dir = PathBuf::from(cache_dir);
    }

    info!(
        event = "cli.thumbs_started",
        concurrency = settings.concurrency,
        cache_dir = %settings.cache_dir.display()
    );

    let pipeline = ThumbnailPipeline::new(settings);
    if matches.get_flag("clean") {
        pipeline.cleanup()?;
    }

    let discovery = discover(matches);
    let thumbnails = match pipeline.create_all(&discovery) {
        Ok(thumbnails) => thumbnails,
        Err(e) => {
            report_failure("create thumbnails", "cli.thumbs_failed", &e);
            return Err(e.into());
        }
    };

    if json_output {
        let items: Vec<_> = thumbnails
            .iter()
            .map(|(key, path)| {
                json!({
                    "screen": key.screen,
                    "window": key.window,
                    "path": path,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if thumbnails.is_empty() {
        println!("No thumbnails created.");
    } else {
        println!("Thumbnails in {}:", pipeline.cache_dir().display());
        table::print_thumbnails_table(&thumbnails);
    }

    info!(event = "cli.thumbs_completed", count = thumbnails.len());
    Ok(())
}

fn handle_devices_command(matches: &ArgMatches) -> CommandResult {
    match matches.subcommand() {
        Some(("list", sub_matches)) => handle_devices_list(sub_matches),
        Some(("configure", sub_matches)) => handle_devices_configure(sub_matches),
        _ => {
            error!(event = "cli.devices_subcommand_unknown");
            Err("Unknown devices subcommand".into())
        }
    }
}

fn handle_devices_list(matches: &ArgMatches) -> CommandResult {
    info!(event = "cli.devices_list_started");

    match v4l2::list_devices() {
        Ok(devices) => {
            print_devices(&devices, matches.get_flag("json"))?;
            info!(event = "cli.devices_list_completed", count = devices.len());
            Ok(())
        }
        Err(e) => {
            report_failure("list devices", "cli.devices_list_failed", &e);
            Err(e.into())
        }
    }
}

fn handle_devices_configure(matches: &ArgMatches) -> CommandResult {
    let config = load_config_with_warning();
    let labels: Vec<String> = match matches.get_many::<String>("labels") {
        Some(labels) => labels.cloned().collect(),
        None => config.devices.labels.clone(),
    };

    info!(event = "cli.devices_configure_started", labels = ?labels);

    match v4l2::configure_devices(&labels, config.devices.exclusive_caps) {
        Ok(devices) => {
            print_devices(&devices, matches.get_flag("json"))?;
            info!(
                event = "cli.devices_configure_completed",
                count = devices.len()
            );
            Ok(())
        }
        Err(e) => {
            report_failure("configure devices", "cli.devices_configure_failed", &e);
            Err(e.into())
        }
    }
}

fn print_devices(devices: &[LoopbackDevice], json_output: bool) -> CommandResult {
    if json_output {
        println!("{}", serde_json::to_string_pretty(devices)?);
    } else if devices.is_empty() {
        println!("No v4l2loopback devices found.");
    } else {
        println!("Loopback devices:");
        table::print_devices_table(devices);
    }
    Ok(())
}

fn handle_status_command(matches: &ArgMatches) -> CommandResult {
    let config = load_config_with_warning();
    info!(event = "cli.status_started");

    let version = ffmpeg_version(&config.capture.ffmpeg_binary);
    let available = v4l2::module_available();
    let loaded = v4l2::module_loaded();
    let discovery = Discovery::probe();
    let displays: Vec<&str> = discovery
        .displays()
        .iter()
        .map(|display| display.display_name())
        .collect();

    if matches.get_flag("json") {
        let status = json!({
            "ffmpeg": {
                "binary": config.capture.ffmpeg_binary,
                "version": version,
            },
            "v4l2loopback": {
                "available": available,
                "loaded": loaded,
            },
            "displays": displays,
            "screens": discovery.screens().into_keys().collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!(
            "ffmpeg:        {}",
            version.as_deref().unwrap_or("not installed")
        );
        println!("v4l2loopback:  {}", module_status(available, loaded));
        if displays.is_empty() {
            println!("displays:      none");
        } else {
            println!("displays:      {}", displays.join(", "));
        }
    }

    info!(
        event = "cli.status_completed",
        ffmpeg_installed = version.is_some(),
        module_loaded = loaded,
        displays = displays.len()
    );
    Ok(())
}

fn module_status(available: bool, loaded: bool) -> &'static str {
    match (available, loaded) {
        (_, true) => "loaded",
        (true, false) => "installed, not loaded",
        (false, false) => "not installed",
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, String> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| format!("missing required argument '--{}'", name))
}
