use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

pub fn init_logging(verbosity: u8) {
	// 0 = errors only, session chatter from the library suppressed
	// 1 (-v) = info for the CLI and the plugin session
	// 2+ (-vv) = debug for everything, including frame routing
	let filter = match verbosity {
		0 => "error,vts=off,vts_runtime=off",
		1 => "info,vts_runtime=warn",
		_ => "debug",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}
