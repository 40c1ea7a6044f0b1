use crate::config::IpLookupConfig;
use crate::error::AppResult;
use reqwest::Client;
use serde::Deserialize;

/// Best-effort public IP resolution. The address the HTTP layer resolved
/// (peer address or X-Forwarded-For via actix's ConnectionInfo) wins; the
/// configured echo endpoint is only a fallback. Every failure degrades to
/// None — the admission guard then simply skips the IP limiter.
#[derive(Clone)]
pub struct IpLookupService {
    http: Client,
    cfg: IpLookupConfig,
}

impl IpLookupService {
    pub fn new(cfg: IpLookupConfig) -> Self {
        let http = Client::builder()
            .user_agent("leadplay-backend/ip-lookup")
            .build()
            .expect("reqwest client");
        Self { http, cfg }
    }

    pub async fn resolve(&self, peer: Option<&str>) -> Option<String> {
        if let Some(ip) = peer
            && !ip.is_empty()
        {
            return Some(ip.to_string());
        }

        let url = self.cfg.url.as_ref()?;
        match self.fetch(url).await {
            Ok(ip) => Some(ip),
            Err(e) => {
                log::warn!("Public IP lookup failed: {e}");
                None
            }
        }
    }

    async fn fetch(&self, url: &str) -> AppResult<String> {
        let resp = self.http.get(url).send().await?;
        let body: IpResponse = resp.json().await?;
        Ok(body.ip)
    }
}

#[derive(Debug, Deserialize)]
struct IpResponse {
    ip: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_prefers_peer_address() {
        let service = IpLookupService::new(IpLookupConfig::default());
        assert_eq!(
            service.resolve(Some("203.0.113.7")).await.as_deref(),
            Some("203.0.113.7")
        );
    }

    #[tokio::test]
    async fn test_resolve_without_peer_or_endpoint_is_none() {
        let service = IpLookupService::new(IpLookupConfig::default());
        assert_eq!(service.resolve(None).await, None);
        assert_eq!(service.resolve(Some("")).await, None);
    }
}
