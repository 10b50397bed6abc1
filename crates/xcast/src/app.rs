use clap::{Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new("xcast")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Capture X11 windows to screenshots and v4l2 loopback streams")
        .long_about(
            "xcast discovers windows on the local X displays, computes their on-screen \
             geometry and drives ffmpeg to take screenshots, generate thumbnails or stream \
             a window into a v4l2loopback virtual camera.",
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        // List subcommand
        .subcommand(
            Command::new("list")
                .about("List screens or windows")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("screens")
                        .about("List screens of all connectable displays")
                        .arg(display_arg())
                        .arg(json_arg()),
                )
                .subcommand(
                    Command::new("windows")
                        .about("List capturable windows")
                        .arg(display_arg())
                        .arg(
                            Arg::new("screen")
                                .long("screen")
                                .short('s')
                                .help("Only list windows on this screen (e.g. \":0.0\")"),
                        )
                        .arg(
                            Arg::new("min-size")
                                .long("min-size")
                                .help("Skip windows whose width and height are both below this")
                                .value_parser(clap::value_parser!(u32)),
                        )
                        .arg(json_arg()),
                ),
        )
        // Screenshot subcommand
        .subcommand(
            Command::new("screenshot")
                .about("Capture a window or screen region to an image file")
                .arg(screen_arg())
                .arg(
                    Arg::new("window")
                        .long("window")
                        .short('w')
                        .help("Window id (hex like 0x1a00007, or decimal)")
                        .conflicts_with("rect")
                        .required_unless_present("rect"),
                )
                .arg(rect_arg().required(false))
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Image file to write (overwritten if it exists)")
                        .required(true),
                )
                .arg(size_arg()),
        )
        // Preview subcommand
        .subcommand(
            Command::new("preview")
                .about("Print the ffmpeg command for a capture without running it")
                .arg(screen_arg())
                .arg(rect_arg().required(true))
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Image file, or device node when --fps is above zero")
                        .required(true),
                )
                .arg(size_arg())
                .arg(
                    Arg::new("fps")
                        .long("fps")
                        .help("Frames per second; 0 takes a single screenshot")
                        .default_value("0"),
                )
                .arg(
                    Arg::new("no-scale")
                        .long("no-scale")
                        .help("Do not scale the source to the output size")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-pad")
                        .long("no-pad")
                        .help("Do not letterbox to the output aspect ratio")
                        .action(ArgAction::SetTrue),
                )
                .arg(json_arg()),
        )
        // Stream subcommand
        .subcommand(
            Command::new("stream")
                .about("Stream a window into a v4l2loopback device")
                .arg(screen_arg())
                .arg(
                    Arg::new("window")
                        .long("window")
                        .short('w')
                        .help("Window id (hex like 0x1a00007, or decimal)")
                        .required(true),
                )
                .arg(
                    Arg::new("device")
                        .long("device")
                        .short('d')
                        .help("Loopback device node (e.g. /dev/video4)")
                        .required(true),
                )
                .arg(
                    Arg::new("fps")
                        .long("fps")
                        .help("Frames per second (default: from config)")
                        .value_parser(clap::value_parser!(u32).range(1..)),
                )
                .arg(size_arg())
                .arg(
                    Arg::new("duration")
                        .long("duration")
                        .help("Stop after this many seconds (default: run until ffmpeg exits)")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        // Thumbs subcommand
        .subcommand(
            Command::new("thumbs")
                .about("Generate thumbnails of every capturable window")
                .arg(display_arg())
                .arg(
                    Arg::new("concurrency")
                        .long("concurrency")
                        .short('j')
                        .help("Maximum concurrent ffmpeg processes (default: from config)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("cache-dir")
                        .long("cache-dir")
                        .help("Directory to write thumbnails into (default: from config)"),
                )
                .arg(
                    Arg::new("clean")
                        .long("clean")
                        .help("Remove the thumbnail directory first")
                        .action(ArgAction::SetTrue),
                )
                .arg(json_arg()),
        )
        // Devices subcommand
        .subcommand(
            Command::new("devices")
                .about("List or configure v4l2loopback devices")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("list")
                        .about("List loopback devices")
                        .arg(json_arg()),
                )
                .subcommand(
                    Command::new("configure")
                        .about("Reload v4l2loopback with one device per label (needs root)")
                        .arg(
                            Arg::new("labels")
                                .help("Device labels (default: from config)")
                                .num_args(0..)
                                .index(1),
                        )
                        .arg(json_arg()),
                ),
        )
        // Status subcommand
        .subcommand(
            Command::new("status")
                .about("Show ffmpeg, v4l2loopback and display availability")
                .arg(json_arg()),
        )
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .help("Output in JSON format")
        .action(ArgAction::SetTrue)
}

fn display_arg() -> Arg {
    Arg::new("display")
        .long("display")
        .help("Only use this display (repeatable; default: probe :0, :1, ...)")
        .action(ArgAction::Append)
}

fn screen_arg() -> Arg {
    Arg::new("screen")
        .long("screen")
        .short('s')
        .help("Screen id (e.g. \":0.0\")")
        .required(true)
}

fn rect_arg() -> Arg {
    Arg::new("rect")
        .long("rect")
        .short('r')
        .help("Source region as X,Y,WIDTH,HEIGHT")
        .value_name("X,Y,W,H")
}

fn size_arg() -> Arg {
    Arg::new("size")
        .long("size")
        .help("Output size as WIDTHxHEIGHT (default: source size)")
        .value_name("WxH")
}
