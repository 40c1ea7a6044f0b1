use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::participation::record_participation,
        handlers::health::health,
    ),
    components(
        schemas(
            ParticipationRequest,
            ContactData,
            ParticipationOutcome,
            OutcomeKind,
            DeviceSignals,
            ParticipationAccepted,
            RateLimitConfig,
            CampaignCounters,
            ApiError,
        )
    ),
    tags(
        (name = "participation", description = "Campaign participation API"),
        (name = "health", description = "Liveness probe"),
    ),
    info(
        title = "Leadplay Backend API",
        version = "1.0.0",
        description = "Participation admission and anti-fraud API for marketing campaigns"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
