//! QR provisioning: render an account's `otpauth://` URI so another
//! authenticator app can scan it.

use image::{GrayImage, ImageEncoder, Luma};
use qrcode::{Color, QrCode};

use crate::totp::types::*;
use crate::totp::uri;

/// Pixels per QR module.
pub const DEFAULT_MODULE_PX: u32 = 6;
/// Upper bound on pixels per module; larger requests are clamped.
pub const MAX_MODULE_PX: u32 = 64;
/// Quiet-zone border, in modules.
const QUIET_ZONE: u32 = 4;

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Rendering
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Encode `text` as a black-on-white PNG QR code. `module_px` is clamped
/// to `1..=MAX_MODULE_PX`.
pub fn text_to_qr_png(text: &str, module_px: u32) -> Result<Vec<u8>, TotpError> {
    let img = render(text, module_px.clamp(1, MAX_MODULE_PX))?;
    let (w, h) = img.dimensions();

    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), w, h, image::ExtendedColorType::L8)
        .map_err(|e| {
            TotpError::new(TotpErrorKind::QrEncodeFailed, format!("PNG encode error: {}", e))
        })?;
    Ok(buf)
}

fn render(text: &str, module_px: u32) -> Result<GrayImage, TotpError> {
    let code = QrCode::new(text.as_bytes()).map_err(|e| {
        TotpError::new(TotpErrorKind::QrEncodeFailed, format!("QR encode error: {}", e))
    })?;
    let width = code.width() as u32;
    let colors = code.to_colors();
    let side = (width + QUIET_ZONE * 2) * module_px;

    Ok(GrayImage::from_fn(side, side, |x, y| {
        let mx = (x / module_px).checked_sub(QUIET_ZONE);
        let my = (y / module_px).checked_sub(QUIET_ZONE);
        let dark = match (mx, my) {
            (Some(mx), Some(my)) if mx < width && my < width => {
                colors[(my * width + mx) as usize] == Color::Dark
            }
            _ => false,
        };
        Luma([if dark { 0u8 } else { 255u8 }])
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Account helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// PNG QR code of the account's provisioning URI.
pub fn account_to_qr_png(account: &Account) -> Result<Vec<u8>, TotpError> {
    text_to_qr_png(&uri::build_otpauth_uri(account), DEFAULT_MODULE_PX)
}

/// `data:image/png;base64,...` form of [`account_to_qr_png`], ready for an
/// `<img src>`.
pub fn account_to_qr_data_uri(account: &Account) -> Result<String, TotpError> {
    use base64::Engine;
    let png = account_to_qr_png(account)?;
    Ok(format!(
        "{}{}",
        DATA_URI_PREFIX,
        base64::engine::general_purpose::STANDARD.encode(png)
    ))
}
