use std::fmt::{Debug, Display};

use colored::*;
use fileshare::core::{get_subscriber, init_subscriber, AppConfig};
use fileshare::fileshare_web_server::FileshareWebServer;
use tokio::task::JoinError;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let file_appender = tracing_appender::rolling::daily("/var/tmp/log/fileshare", "app");

    let subscriber = get_subscriber("fileshare".into(), "info".into(), file_appender);
    init_subscriber(subscriber);

    let config = AppConfig::new().expect("cant build our appConfig object");

    let fileshare_web_server = FileshareWebServer::build(config.clone())
        .await
        .expect("failed to build the fileshare web server");

    let server_task = tokio::spawn(fileshare_web_server.run_until_stopped());

    println!("{}", "-----------------------------------------".green());
    println!(
        "🚀 Server started on Addr: {}:{}",
        config.fileshare_server_config.host, config.fileshare_server_config.port
    );
    println!("{}", "-----------------------------------------".green());

    tokio::select! {
        o = server_task => {report_exit("fileshare web server", o);}
    }
    Ok(())
}

fn report_exit(task_name: &str, outcome: Result<Result<(), impl Debug + Display>, JoinError>) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{} has exited", task_name)
        }
        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} failed",
                task_name
            )
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{}' task failed to complete",
                task_name
            )
        }
    }
}
