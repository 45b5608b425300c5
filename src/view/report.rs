//! CSV report export.

use crate::model::Fatura;

/// Serialize invoices as CSV with the backend's field names as headers
pub fn csv_report(faturas: &[Fatura]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record([
        "id",
        "nome_cliente",
        "documento_cliente",
        "email_cliente",
        "numero_instalacao",
        "valor_total",
        "mes_referencia",
        "data_vencimento",
        "ja_pago",
    ])?;

    for f in faturas {
        writer.write_record([
            f.id.to_string(),
            f.customer_name.clone(),
            f.customer_document.clone(),
            f.customer_email.clone(),
            f.installation_number.clone(),
            format!("{:.2}", f.total_amount),
            f.reference_month.clone(),
            f.due_date.clone(),
            f.paid.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
