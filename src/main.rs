use std::path::PathBuf;

use anyhow::{Context, Result};
use decade_portrait::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logger::init(config.verbose_logging);

    let photo = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("用法: decade_portrait <照片路径>")?;

    // 初始化并运行应用
    App::initialize(config, &photo).await?.run().await?;

    Ok(())
}
