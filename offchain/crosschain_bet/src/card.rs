//! Bet card shown as the offer icon. Cosmetic only: nothing here can fail an offer.

use std::io::Cursor;

use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{imageops, imageops::FilterType, DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use log::warn;

use crate::types::MarketSnapshot;

pub const CARD_WIDTH: u32 = 490;
pub const CARD_HEIGHT: u32 = 450;
const LOGO_SIZE: u32 = 120;
const HOME_LOGO_AT: (i64, i64) = (40, 190);
const AWAY_LOGO_AT: (i64, i64) = (315, 190);

const BACKGROUND: Rgba<u8> = Rgba([0x45, 0x45, 0x45, 0xff]);
const MUTED: Rgba<u8> = Rgba([0x87, 0x87, 0x87, 0xff]);
const WHITE: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);

static FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Used when the card itself cannot be produced.
pub const FALLBACK_ICON_URL: &str =
    "https://dev-avatars.azuro.org/images/33/1001000000001595522983/Korona%20Kielce.png";

#[async_trait]
pub trait IconRenderer: Send + Sync {
    /// `data:` URI of the rendered card, or `None` if rendering failed outright.
    async fn render(&self, snapshot: &MarketSnapshot) -> Option<String>;
}

pub struct CardRenderer {
    http: reqwest::Client,
}

impl CardRenderer {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn load_logo(&self, url: Option<&str>) -> Option<DynamicImage> {
        let url = url?;
        match self.fetch_logo(url).await {
            Ok(img) => Some(img),
            Err(e) => {
                warn!("[card] failed to load logo {url}: {e}");
                None
            }
        }
    }

    async fn fetch_logo(&self, url: &str) -> anyhow::Result<DynamicImage> {
        let bytes = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(image::load_from_memory(&bytes)?)
    }
}

#[async_trait]
impl IconRenderer for CardRenderer {
    async fn render(&self, snapshot: &MarketSnapshot) -> Option<String> {
        let home_url = snapshot.home().and_then(|p| p.image.as_deref());
        let away_url = snapshot.away().and_then(|p| p.image.as_deref());
        let (home, away) = tokio::join!(self.load_logo(home_url), self.load_logo(away_url));

        match render_card_png(&CardText::from_snapshot(snapshot), home.as_ref(), away.as_ref()) {
            Ok(png) => Some(png_data_uri(&png)),
            Err(e) => {
                warn!("[card] rendering failed: {e}");
                None
            }
        }
    }
}

pub fn png_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}

/// Grey tile standing in for a logo that could not be loaded.
pub fn placeholder_logo() -> DynamicImage {
    let mut tile = RgbaImage::from_pixel(LOGO_SIZE, LOGO_SIZE, MUTED);
    let inner = Rgba([0x5c, 0x5c, 0x5c, 0xff]);
    for (x, y, px) in tile.enumerate_pixels_mut() {
        let edge = x < 4 || y < 4 || x >= LOGO_SIZE - 4 || y >= LOGO_SIZE - 4;
        if !edge {
            *px = inner;
        }
    }
    DynamicImage::ImageRgba8(tile)
}

/// Words printed on the card, borrowed from the snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct CardText<'a> {
    pub sport: &'a str,
    pub league: &'a str,
    pub home: &'a str,
    pub away: &'a str,
}

impl<'a> CardText<'a> {
    pub fn from_snapshot(snapshot: &'a MarketSnapshot) -> Self {
        Self {
            sport: &snapshot.sport,
            league: &snapshot.league,
            home: snapshot.home().map_or("", |p| p.name.as_str()),
            away: snapshot.away().map_or("", |p| p.name.as_str()),
        }
    }
}

fn card_font() -> Option<FontRef<'static>> {
    match FontRef::try_from_slice(FONT_BYTES) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!("[card] bundled font unusable: {e}");
            None
        }
    }
}

/// Draws `text` horizontally centred on `center_x`, sitting on `baseline`.
fn draw_centered(
    canvas: &mut RgbaImage,
    font: &FontRef<'_>,
    text: &str,
    center_x: i32,
    baseline: i32,
    size: f32,
    color: Rgba<u8>,
) {
    if text.is_empty() {
        return;
    }
    let scale = PxScale::from(size);
    let (width, _) = text_size(scale, font, text);
    let ascent = font.as_scaled(scale).ascent().round() as i32;
    let x = center_x - (width / 2) as i32;
    draw_text_mut(canvas, color, x, baseline - ascent, scale, font, text);
}

pub fn compose_card(
    text: &CardText<'_>,
    home: Option<&DynamicImage>,
    away: Option<&DynamicImage>,
) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(CARD_WIDTH, CARD_HEIGHT, BACKGROUND);
    let placeholder = placeholder_logo();

    for (logo, (x, y)) in [(home, HOME_LOGO_AT), (away, AWAY_LOGO_AT)] {
        let logo = logo.unwrap_or(&placeholder);
        let scaled = logo.resize_exact(LOGO_SIZE, LOGO_SIZE, FilterType::Triangle);
        imageops::overlay(&mut canvas, &scaled.to_rgba8(), x, y);
    }

    let Some(font) = card_font() else {
        return canvas;
    };
    let mid = (CARD_WIDTH / 2) as i32;
    draw_centered(&mut canvas, &font, text.sport, mid, 120, 20.0, MUTED);
    draw_centered(&mut canvas, &font, text.league, mid, 155, 24.0, WHITE);
    draw_centered(&mut canvas, &font, "V", mid, 280, 35.0, WHITE);
    // names sit under the logo centres
    draw_centered(&mut canvas, &font, text.home, 100, 350, 25.0, WHITE);
    draw_centered(&mut canvas, &font, text.away, 375, 350, 25.0, WHITE);
    canvas
}

pub fn render_card_png(
    text: &CardText<'_>,
    home: Option<&DynamicImage>,
    away: Option<&DynamicImage>,
) -> image::ImageResult<Vec<u8>> {
    let card = compose_card(text, home, away);
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(card).write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: CardText<'static> = CardText {
        sport: "Football",
        league: "Ekstraklasa",
        home: "Korona",
        away: "Lech",
    };

    fn band_differs(a: &RgbaImage, b: &RgbaImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> bool {
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .any(|(x, y)| a.get_pixel(x, y) != b.get_pixel(x, y))
    }

    #[test]
    fn missing_logos_fall_back_to_placeholder() {
        let card = compose_card(&CardText::default(), None, None);
        assert_eq!(card.dimensions(), (CARD_WIDTH, CARD_HEIGHT));
        // border pixel of each placeholder tile
        assert_eq!(*card.get_pixel(40, 190), MUTED);
        assert_eq!(*card.get_pixel(315, 190), MUTED);
        assert_eq!(*card.get_pixel(5, 5), BACKGROUND);
    }

    #[test]
    fn supplied_logo_is_scaled_into_place() {
        let red = DynamicImage::ImageRgba8(RgbaImage::from_pixel(300, 300, Rgba([255, 0, 0, 255])));
        let card = compose_card(&CardText::default(), Some(&red), None);
        assert_eq!(*card.get_pixel(100, 250), Rgba([255, 0, 0, 255]));
        assert_ne!(*card.get_pixel(375, 250), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn market_text_is_drawn_in_its_rows() {
        let blank = compose_card(&CardText::default(), None, None);
        let card = compose_card(&TEXT, None, None);

        // sport and league, centred
        assert!(band_differs(&blank, &card, 180..310, 100..122));
        assert!(band_differs(&blank, &card, 150..340, 132..157));
        // team names under each logo
        assert!(band_differs(&blank, &card, 40..160, 325..352));
        assert!(band_differs(&blank, &card, 315..435, 325..352));
        // nothing spills into the corners
        assert!(!band_differs(&blank, &card, 0..30, 0..60));
    }

    #[test]
    fn versus_mark_is_always_drawn() {
        let card = compose_card(&CardText::default(), None, None);
        let plain = RgbaImage::from_pixel(CARD_WIDTH, CARD_HEIGHT, BACKGROUND);
        assert!(band_differs(&plain, &card, 225..265, 250..282));
    }

    #[test]
    fn text_comes_from_snapshot() {
        use crate::types::{MarketStatus, Participant};
        let snapshot = MarketSnapshot {
            status: MarketStatus::Created,
            title: None,
            sport: "Football".into(),
            league: "Ekstraklasa".into(),
            starts_at: 0,
            participants: vec![
                Participant { name: "Korona".into(), image: None, sort_order: 0 },
                Participant { name: "Lech".into(), image: None, sort_order: 1 },
            ],
            condition_id: None,
            outcomes: Vec::new(),
        };
        let text = CardText::from_snapshot(&snapshot);
        assert_eq!((text.sport, text.league, text.home, text.away), ("Football", "Ekstraklasa", "Korona", "Lech"));
    }

    #[test]
    fn png_is_wrapped_in_data_uri() {
        let png = render_card_png(&TEXT, None, None).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let uri = png_data_uri(&png);
        let payload = uri.strip_prefix("data:image/png;base64,").unwrap();
        assert_eq!(BASE64.decode(payload).unwrap(), png);
    }
}
