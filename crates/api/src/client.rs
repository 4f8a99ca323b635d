//! Typed endpoint surface for the LabLink backend

use serde::Deserialize;

use lablink_common::Result;

use crate::gateway::RequestGateway;
use crate::types::{
    EmailDraft, EmailRequest, MatchResult, Professor, SendEmailRequest, StudentProfile,
};

/// Typed client for the LabLink REST API. All calls ride the resilient
/// gateway, so 401 recovery and credential refresh are transparent.
pub struct ApiClient {
    gateway: RequestGateway,
}

#[derive(Debug, Deserialize)]
struct MatchEnvelope {
    #[serde(default)]
    matches: Vec<MatchResult>,
}

#[derive(Debug, Deserialize)]
struct Ack {
    #[serde(default)]
    ok: bool,
}

impl ApiClient {
    pub fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }

    /// Access the underlying gateway for bespoke requests.
    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    /// Backend liveness probe.
    pub async fn health(&self) -> Result<bool> {
        let ack: Ack = self.gateway.get_json("/api/health").await?;
        Ok(ack.ok)
    }

    /// Ordered department names. No authentication required.
    pub async fn departments(&self) -> Result<Vec<String>> {
        self.gateway.get_json("/api/departments").await
    }

    pub async fn professors(&self) -> Result<Vec<Professor>> {
        self.gateway.get_json("/api/professors").await
    }

    pub async fn professor(&self, id: i64) -> Result<Professor> {
        self.gateway
            .get_json(&format!("/api/professors/{id}"))
            .await
    }

    /// Score the student profile against faculty, optionally scoped to a
    /// department. Unwraps the backend's `{ matches: [...] }` envelope.
    pub async fn match_professors(
        &self,
        profile: &StudentProfile,
        department: Option<&str>,
    ) -> Result<Vec<MatchResult>> {
        let path = match department {
            Some(department) => {
                format!("/api/match?department={}", urlencoding::encode(department))
            }
            None => "/api/match".to_string(),
        };
        let envelope: MatchEnvelope = self.gateway.post_json(&path, profile).await?;
        Ok(envelope.matches)
    }

    pub async fn generate_email(&self, request: &EmailRequest) -> Result<EmailDraft> {
        self.gateway.post_json("/api/email/generate", request).await
    }

    pub async fn send_email(&self, request: &SendEmailRequest) -> Result<()> {
        let _: Ack = self.gateway.post_json("/api/email/send", request).await?;
        Ok(())
    }
}
