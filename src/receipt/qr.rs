//! Verification links and their QR codes.

use qrcode::render::svg;
use qrcode::QrCode;
use url::Url;

use crate::receipt::builder::ReceiptError;

/// Smallest rendered edge, in pixels.
const QR_MIN_SIZE: u32 = 280;

/// `<base>/verify?hash=<digest>[&did=<did>][&tx=<txHash>]`
pub fn verification_url(
    base: &str,
    hash: &str,
    did: Option<&str>,
    tx: Option<&str>,
) -> Result<Url, ReceiptError> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| ReceiptError::InvalidBase(base.to_string()))?
        .pop_if_empty()
        .push("verify");

    {
        let mut query = url.query_pairs_mut();
        query.clear().append_pair("hash", hash);
        if let Some(did) = did.filter(|d| !d.is_empty()) {
            query.append_pair("did", did);
        }
        if let Some(tx) = tx.filter(|t| !t.is_empty()) {
            query.append_pair("tx", tx);
        }
    }
    Ok(url)
}

/// Render `data` as an SVG QR code.
pub fn qr_svg(data: &str) -> Result<String, ReceiptError> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| ReceiptError::Qr(e.to_string()))?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
        .quiet_zone(true)
        .build())
}
