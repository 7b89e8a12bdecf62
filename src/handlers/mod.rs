pub mod health;
pub mod limit_up;

use actix_web::web;

/// 注册 /api/v1 下的全部路由，api_key 只用于管理接口
pub fn config(api_key: String) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(
            web::scope("/api/v1")
                .configure(health::config)
                .configure(limit_up::config(api_key)),
        );
    }
}
