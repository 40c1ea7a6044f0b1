use crate::models::*;
use crate::services::ParticipationService;
use crate::store::PgParticipationStore;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

pub type AppParticipationService = ParticipationService<PgParticipationStore>;

#[utoipa::path(
    post,
    path = "/participations",
    tag = "participation",
    request_body = ParticipationRequest,
    responses(
        (status = 200, description = "Participation acceptée et enregistrée", body = ParticipationAccepted),
        (status = 400, description = "Champ de contact invalide"),
        (status = 429, description = "Participant bloqué ou limite de tentatives atteinte")
    )
)]
/// Record a campaign participation: validate the contact fields, run the
/// anti-fraud admission checks, then persist the record and bump the
/// campaign counters (both best-effort).
pub async fn record_participation(
    service: web::Data<AppParticipationService>,
    req: HttpRequest,
    body: web::Json<ParticipationRequest>,
) -> Result<HttpResponse> {
    // realip_remote_addr honours X-Forwarded-For behind the reverse proxy
    let client_ip = req
        .connection_info()
        .realip_remote_addr()
        .map(str::to_string);

    match service
        .record_participation(body.into_inner(), client_ip)
        .await
    {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn participation_config(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/participations",
        web::post().to(record_participation),
    );
}
