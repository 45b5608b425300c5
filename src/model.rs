//! Invoice Data Model
//!
//! Records exchanged with the backend. Field names on the wire follow the
//! backend's JSON shape (`nome_cliente`, `valor_total`, ...).

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Server-assigned invoice identifier
pub type FaturaId = i64;

/// An invoice record as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fatura {
    pub id: FaturaId,

    #[serde(rename = "nome_cliente")]
    pub customer_name: String,

    #[serde(rename = "documento_cliente")]
    pub customer_document: String,

    #[serde(rename = "email_cliente")]
    pub customer_email: String,

    /// Groups invoices under one utility connection
    #[serde(rename = "numero_instalacao")]
    pub installation_number: String,

    #[serde(rename = "valor_total")]
    pub total_amount: f64,

    #[serde(rename = "mes_referencia")]
    pub reference_month: String,

    #[serde(rename = "data_vencimento")]
    pub due_date: String,

    #[serde(rename = "ja_pago", default)]
    pub paid: bool,

    #[serde(rename = "url_pdf", default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,

    #[serde(rename = "data_criacao", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Fatura {
    /// Creation timestamp, if the backend sent one in a recognizable format
    pub fn created_at_parsed(&self) -> Option<NaiveDateTime> {
        let raw = self.created_at.as_deref()?;
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc()))
    }

    /// Due date as a calendar date when it is in ISO `yyyy-mm-dd` or `dd/mm/yyyy` form
    pub fn due_date_parsed(&self) -> Option<NaiveDate> {
        let raw = self.due_date.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
            .ok()
    }
}

/// Editable invoice fields, sent on create and on full-replace update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaturaInput {
    #[serde(rename = "nome_cliente")]
    pub customer_name: String,

    #[serde(rename = "documento_cliente")]
    pub customer_document: String,

    #[serde(rename = "email_cliente")]
    pub customer_email: String,

    #[serde(rename = "numero_instalacao")]
    pub installation_number: String,

    #[serde(rename = "valor_total")]
    pub total_amount: f64,

    #[serde(rename = "mes_referencia")]
    pub reference_month: String,

    #[serde(rename = "data_vencimento")]
    pub due_date: String,

    #[serde(rename = "url_pdf", default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
}

impl FaturaInput {
    /// Prefill the edit form from an existing record
    pub fn from_fatura(fatura: &Fatura) -> Self {
        Self {
            customer_name: fatura.customer_name.clone(),
            customer_document: fatura.customer_document.clone(),
            customer_email: fatura.customer_email.clone(),
            installation_number: fatura.installation_number.clone(),
            total_amount: fatura.total_amount,
            reference_month: fatura.reference_month.clone(),
            due_date: fatura.due_date.clone(),
            pdf_url: fatura.pdf_url.clone(),
        }
    }

    /// Check the fields against the limits the backend enforces
    pub fn validate(&self) -> Result<(), String> {
        check_len("customer name", &self.customer_name, 1, 255)?;
        check_len("customer document", &self.customer_document, 11, 20)?;
        check_len("installation number", &self.installation_number, 1, 20)?;
        check_len("reference month", &self.reference_month, 1, 50)?;
        check_len("due date", &self.due_date, 1, 20)?;

        if !self.total_amount.is_finite() || self.total_amount <= 0.0 {
            return Err(format!(
                "total amount must be greater than zero (got {})",
                self.total_amount
            ));
        }

        Ok(())
    }
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(format!(
            "{} must be between {} and {} characters (got {})",
            field, min, max, len
        ));
    }
    Ok(())
}

/// Response from `POST /processar_email/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessEmailResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default)]
    pub message: String,

    #[serde(rename = "faturas_processadas", default)]
    pub processed: u32,

    #[serde(rename = "faturas_salvas", default, skip_serializing_if = "Option::is_none")]
    pub saved: Option<u32>,
}

impl ProcessEmailResponse {
    /// Older backends omit `status`; only an explicit non-success value counts as failure
    pub fn is_success(&self) -> bool {
        self.status.as_deref().map_or(true, |s| s == "success")
    }
}

/// Response from `POST /create-checkout-session/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub checkout_url: String,
}

/// Response from `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub services: BTreeMap<String, String>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample(id: FaturaId, name: &str, installation: &str, amount: f64, paid: bool) -> Fatura {
        Fatura {
            id,
            customer_name: name.to_string(),
            customer_document: "12345678901".to_string(),
            customer_email: format!("cliente{}@example.com", id),
            installation_number: installation.to_string(),
            total_amount: amount,
            reference_month: "JAN/2024".to_string(),
            due_date: "2024-02-10".to_string(),
            paid,
            pdf_url: None,
            created_at: None,
        }
    }

    pub(crate) fn sample_input(name: &str, installation: &str, amount: f64) -> FaturaInput {
        FaturaInput {
            customer_name: name.to_string(),
            customer_document: "12345678901".to_string(),
            customer_email: "cliente@example.com".to_string(),
            installation_number: installation.to_string(),
            total_amount: amount,
            reference_month: "JAN/2024".to_string(),
            due_date: "2024-02-10".to_string(),
            pdf_url: None,
        }
    }

    #[test]
    fn test_deserialize_backend_shape() {
        let json = r#"{
            "id": 7,
            "nome_cliente": "João Silva",
            "documento_cliente": "12345678901",
            "email_cliente": "joao@example.com",
            "numero_instalacao": "300123",
            "valor_total": 189.9,
            "mes_referencia": "MAR/2024",
            "data_vencimento": "2024-04-15",
            "ja_pago": true,
            "data_criacao": "2024-03-20T10:15:30.123456"
        }"#;

        let fatura: Fatura = serde_json::from_str(json).unwrap();
        assert_eq!(fatura.id, 7);
        assert_eq!(fatura.customer_name, "João Silva");
        assert_eq!(fatura.installation_number, "300123");
        assert!(fatura.paid);
        assert!(fatura.created_at_parsed().is_some());
        assert_eq!(
            fatura.due_date_parsed(),
            NaiveDate::from_ymd_opt(2024, 4, 15)
        );
    }

    #[test]
    fn test_paid_defaults_to_false() {
        let json = r#"{
            "id": 1, "nome_cliente": "A", "documento_cliente": "12345678901",
            "email_cliente": "a@b.c", "numero_instalacao": "1", "valor_total": 10.0,
            "mes_referencia": "JAN", "data_vencimento": "10/02/2024"
        }"#;
        let fatura: Fatura = serde_json::from_str(json).unwrap();
        assert!(!fatura.paid);
        assert_eq!(fatura.due_date_parsed(), NaiveDate::from_ymd_opt(2024, 2, 10));
    }

    #[test]
    fn test_input_serializes_wire_names() {
        let input = sample_input("Maria", "42", 99.5);
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["nome_cliente"], "Maria");
        assert_eq!(value["numero_instalacao"], "42");
        assert_eq!(value["valor_total"], 99.5);
        assert!(value.get("url_pdf").is_none());
        assert!(value.get("ja_pago").is_none());
    }

    #[test]
    fn test_validate_limits() {
        assert!(sample_input("Maria", "42", 99.5).validate().is_ok());

        let mut input = sample_input("Maria", "42", 0.0);
        assert!(input.validate().unwrap_err().contains("total amount"));

        input.total_amount = f64::NAN;
        assert!(input.validate().is_err());

        let mut input = sample_input("", "42", 10.0);
        assert!(input.validate().unwrap_err().contains("customer name"));

        input.customer_name = "Maria".to_string();
        input.customer_document = "123".to_string();
        assert!(input.validate().unwrap_err().contains("customer document"));
    }

    #[test]
    fn test_from_fatura_roundtrips_fields() {
        let fatura = sample(3, "Ana", "77", 50.0, false);
        let input = FaturaInput::from_fatura(&fatura);
        assert_eq!(input.customer_name, "Ana");
        assert_eq!(input.installation_number, "77");
        assert_eq!(input.total_amount, 50.0);
    }

    #[test]
    fn test_process_response_status() {
        let legacy: ProcessEmailResponse =
            serde_json::from_str(r#"{"message": "ok", "faturas_processadas": 2}"#).unwrap();
        assert!(legacy.is_success());
        assert_eq!(legacy.processed, 2);
        assert_eq!(legacy.saved, None);

        let failed: ProcessEmailResponse =
            serde_json::from_str(r#"{"status": "error", "message": "gmail down"}"#).unwrap();
        assert!(!failed.is_success());
    }
}
