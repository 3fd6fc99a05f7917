// ==============================================================================
// audit.rs - Audit Trail for Pharmacogenomic Analyses
// ==============================================================================
// Description: Structured audit events for every analysis run
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Events are emitted as tracing records on the `audit` target. Collect them
// with a dedicated subscriber layer or a custom AuditSink.
// ==============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    AnalysisStarted,
    AnalysisCompleted,
    InputRejected,
    UnknownDrug,
    AmbiguousDiplotype,
    ExplanationFallback,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::AnalysisStarted => "analysis_started",
            AuditEventType::AnalysisCompleted => "analysis_completed",
            AuditEventType::InputRejected => "input_rejected",
            AuditEventType::UnknownDrug => "unknown_drug",
            AuditEventType::AmbiguousDiplotype => "ambiguous_diplotype",
            AuditEventType::ExplanationFallback => "explanation_fallback",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuditEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    /// Report the event belongs to
    pub report_id: Option<Uuid>,
    /// Drug, gene or file the event concerns
    pub resource: Option<String>,
    pub details: serde_json::Value,
    pub severity: LogSeverity,
}

impl AuditEvent {
    pub fn new(
        event_type: AuditEventType,
        report_id: Option<Uuid>,
        resource: Option<String>,
        details: serde_json::Value,
    ) -> Self {
        let severity = match event_type {
            AuditEventType::UnknownDrug
            | AuditEventType::AmbiguousDiplotype
            | AuditEventType::ExplanationFallback => LogSeverity::Warning,

            AuditEventType::InputRejected => LogSeverity::Error,

            _ => LogSeverity::Info,
        };

        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type,
            report_id,
            resource,
            details,
            severity,
        }
    }
}

/// Destination for audit events
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Emits each event as a structured tracing record
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        let report_id = event.report_id.map(|id| id.to_string()).unwrap_or_default();
        let resource = event.resource.as_deref().unwrap_or("");

        match event.severity {
            LogSeverity::Info => info!(
                target: "audit",
                event_id = %event.id,
                event_type = event.event_type.as_str(),
                report_id = %report_id,
                resource = resource,
                details = %event.details,
                "audit event"
            ),
            LogSeverity::Warning => warn!(
                target: "audit",
                event_id = %event.id,
                event_type = event.event_type.as_str(),
                report_id = %report_id,
                resource = resource,
                details = %event.details,
                "audit event"
            ),
            LogSeverity::Error => error!(
                target: "audit",
                event_id = %event.id,
                event_type = event.event_type.as_str(),
                report_id = %report_id,
                resource = resource,
                details = %event.details,
                "audit event"
            ),
        }
    }
}

/// Keeps events in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
