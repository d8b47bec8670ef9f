use catalog_server::{Config, Server, ServerState, init_logger_with_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 工作目录, 日志)
    dotenv::dotenv().ok();
    let config = Config::from_env();
    config.ensure_work_dir_structure()?;
    // 生产环境写滚动日志文件，开发环境输出到 stdout
    let logs_dir = config.logs_dir();
    let log_dir = if config.is_production() {
        logs_dir.to_str()
    } else {
        None
    };
    init_logger_with_file(Some(&config.log_level), log_dir);

    tracing::info!("Catalog server starting...");

    // 2. 初始化服务器状态 (数据库)
    let state = ServerState::initialize(&config).await?;

    // 3. 启动 HTTP 服务器
    let server = Server::with_state(config, state);
    server.run().await
}
