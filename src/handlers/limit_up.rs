use actix_web::{error::InternalError, web, HttpResponse, Result};
use chrono::NaiveDate;

use crate::middleware::ApiKeyMiddleware;
use crate::models::{AdminRequest, ApiResponse, CachedDay, PipelineRun, RecentRunSummary, RunQuery};
use crate::services::calendar::{parse_trade_date, today};
use crate::services::pipeline::PipelineOrchestrator;

/// 缺省取北京时间今天；格式错误返回 None
fn resolve_date(raw: Option<&str>) -> Option<NaiveDate> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_trade_date(s),
        None => Some(today()),
    }
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::<()>::error(message))
}

fn run_response(run: PipelineRun) -> HttpResponse {
    let message = run.message.clone();
    HttpResponse::Ok().json(ApiResponse::with_status(run.success, message, run))
}

fn recent_response(summary: RecentRunSummary) -> HttpResponse {
    let message = format!(
        "最近 {} 天: 成功 {} 天, 失败 {} 天",
        summary.days, summary.succeeded, summary.failed
    );
    let success = summary.succeeded > 0;
    HttpResponse::Ok().json(ApiResponse::with_status(success, message, summary))
}

/// 同步执行单日预加载
pub async fn run_once(
    orchestrator: web::Data<PipelineOrchestrator>,
    query: web::Query<RunQuery>,
) -> Result<HttpResponse> {
    let Some(date) = resolve_date(query.date.as_deref()) else {
        return Ok(bad_request(format!("无效的日期: {}", query.date.as_deref().unwrap_or_default())));
    };
    Ok(run_response(orchestrator.run(date).await))
}

/// 管理接口：preload 处理单日，preload_recent 处理以该日结尾的最近若干天
pub async fn admin(
    orchestrator: web::Data<PipelineOrchestrator>,
    body: web::Json<AdminRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    let Some(date) = resolve_date(request.date.as_deref()) else {
        return Ok(bad_request(format!("无效的日期: {}", request.date.unwrap_or_default())));
    };

    log::info!("收到管理请求: action={} date={}", request.action, date);
    match request.action.as_str() {
        "preload" => Ok(run_response(orchestrator.run(date).await)),
        "preload_recent" => Ok(recent_response(orchestrator.run_recent(date).await)),
        other => Ok(bad_request(format!("未知的 action: {}", other))),
    }
}

/// 读取某日已缓存的快照和表现矩阵
pub async fn get_cached(
    orchestrator: web::Data<PipelineOrchestrator>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let raw = path.into_inner();
    let Some(date) = parse_trade_date(&raw) else {
        return Ok(bad_request(format!("无效的日期: {}", raw)));
    };

    let writer = orchestrator.writer();
    if !writer.is_available() {
        return Ok(HttpResponse::ServiceUnavailable()
            .json(ApiResponse::<CachedDay>::error("缓存存储不可用".to_string())));
    }

    let loaded = writer
        .load_snapshot(date)
        .and_then(|records| Ok((records, writer.load_performance(date)?)));
    match loaded {
        Ok((records, performance)) => Ok(HttpResponse::Ok().json(ApiResponse::success(CachedDay {
            date,
            records,
            performance,
        }))),
        Err(e) => {
            log::error!("读取 {} 缓存失败: {}", date, e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<CachedDay>::error(e.to_string())))
        }
    }
}

pub fn config(api_key: String) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            let response = bad_request(format!("请求体无效: {}", err));
            InternalError::from_response(err, response).into()
        });

        cfg.service(
            web::scope("/limit-up")
                .route("/run", web::get().to(run_once))
                .route("/cache/{date}", web::get().to(get_cached))
                .service(
                    web::resource("/admin")
                        .app_data(json_config)
                        .wrap(ApiKeyMiddleware::new(api_key))
                        .route(web::post().to(admin)),
                ),
        );
    }
}
