//! 涨停数据预加载服务
//!
//! 抓取每日涨停快照，计算涨停股随后若干交易日的涨跌幅，
//! 并写入本地 SQLite 缓存。通过 RESTful 接口触发和查询。

mod config;     // 配置加载
mod error;      // 错误类型
mod handlers;   // HTTP 请求处理器
mod middleware; // 中间件
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

#[cfg(test)]
mod test_helpers;

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use crate::config::AppConfig;
use crate::services::cache::{CacheWriter, StorageClient};
use crate::services::pipeline::PipelineOrchestrator;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::load();

    // RUST_LOG 优先，否则使用配置中的日志级别
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));

    if config.api.api_key.is_empty() {
        log::warn!("未设置 API_KEY，管理接口将拒绝所有请求");
    }
    if config.providers.batch_token.is_empty() {
        log::warn!("未设置 BATCH_TOKEN，批量接口将失败并走日K线兜底");
    }

    // 存储客户端由这里创建，生命周期与进程一致
    let storage = StorageClient::connect(&config.storage);
    let orchestrator = PipelineOrchestrator::from_config(&config, CacheWriter::new(storage))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let orchestrator = web::Data::new(orchestrator);

    let bind_addr = config.bind_addr();
    let api_key = config.api.api_key.clone();
    log::info!("启动涨停数据预加载服务，监听 {}", bind_addr);

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(orchestrator.clone())
            .configure(handlers::config(api_key.clone()))
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(bind_addr)?.run().await
}
