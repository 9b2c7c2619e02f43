use clap::Parser;

use presence_tracker::cli::{Cli, Commands, ConfigCommands, generate_config};
use presence_tracker::config::{get_config, init_config_from};
use presence_tracker::runtime::run_server;
use presence_tracker::system::logging::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Commands::Config {
        action: ConfigCommands::Generate { output_path, force },
    } = cli.command()
    {
        return match generate_config(output_path.as_deref(), *force) {
            Ok(path) => {
                println!("Sample configuration written to {}", path);
                Ok(())
            }
            Err(e) => {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
        };
    }

    init_config_from(&cli.config);
    let config = get_config();

    // guard 必须存活到进程退出，保证日志刷盘
    let _log_guard = init_logging(&config.logging)?;

    run_server().await
}
