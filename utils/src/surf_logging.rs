use std::time::Instant;
use surf::middleware::{Middleware, Next};
use surf::{Client, Request, Response, Result};

/// Surf middleware that logs every outgoing request and the status it came back with.
#[derive(Debug, Default, Clone, Copy)]
pub struct SurfLogging;

#[surf::utils::async_trait]
impl Middleware for SurfLogging {
    async fn handle(&self, req: Request, client: Client, next: Next<'_>) -> Result<Response> {
        let method = req.method();
        let url = req.url().clone();
        let started = Instant::now();
        log::debug!("--> {} {}", method, url);

        match next.run(req, client).await {
            Ok(res) => {
                log::debug!(
                    "<-- {} {} {} ({:?})",
                    res.status(),
                    method,
                    url,
                    started.elapsed()
                );
                Ok(res)
            }
            Err(e) => {
                log::warn!("<-- {} {} failed after {:?}: {}", method, url, started.elapsed(), e);
                Err(e)
            }
        }
    }
}
