use crate::error::{ReportError, Result};
use crate::types::Pt;
use rustybuzz::{Direction as HbDirection, Face as HbFace, UnicodeBuffer};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use ttf_parser::GlyphId;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct TextWidthKey {
    font_index: usize,
    size_milli: i64,
    text: String,
}

#[derive(Debug)]
struct TextWidthCache {
    map: HashMap<TextWidthKey, Pt>,
    order: VecDeque<TextWidthKey>,
    max_entries: usize,
}

impl TextWidthCache {
    fn new(max_entries: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            max_entries,
        }
    }

    fn get(&self, key: &TextWidthKey) -> Option<Pt> {
        self.map.get(key).copied()
    }

    fn insert(&mut self, key: TextWidthKey, value: Pt) {
        if self.map.contains_key(&key) {
            return;
        }
        self.map.insert(key.clone(), value);
        self.order.push_back(key);
        while self.map.len() > self.max_entries {
            match self.order.pop_front() {
                Some(old) => {
                    self.map.remove(&old);
                }
                None => break,
            }
        }
    }
}

/// Fonts registered for measurement. Lookups are by case-insensitive family,
/// full or PostScript name. Anything not registered is measured by the
/// fallback metric in [`crate::text`].
#[derive(Debug)]
pub struct FontRegistry {
    fonts: Vec<RegisteredFont>,
    lookup: HashMap<String, usize>,
    text_width_cache: Mutex<TextWidthCache>,
}

#[derive(Debug)]
pub(crate) struct RegisteredFont {
    pub(crate) name: String,
    data: Vec<u8>,
    metrics: FontMetrics,
}

#[derive(Debug)]
struct FontMetrics {
    first_char: u8,
    last_char: u8,
    widths: Vec<u16>,
    glyph_ids: Vec<u16>,
    missing_width: u16,
    kerning: HashMap<(u16, u16), i16>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        Self {
            fonts: Vec::new(),
            lookup: HashMap::new(),
            text_width_cache: Mutex::new(TextWidthCache::new(20_000)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Registers every `.ttf`/`.otf` file directly inside `path`. Unreadable
    /// entries are skipped.
    pub fn register_dir(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let mut count = 0;
        let mut paths: Vec<_> = fs::read_dir(path.as_ref())?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_font_file(path))
            .collect();
        // Directory order is platform dependent; alias collisions must not be.
        paths.sort();
        for path in paths {
            if self.register_file(&path).is_ok() {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn register_file(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        if !is_font_file(path) {
            return Err(ReportError::InvalidConfiguration(format!(
                "not a font file: {}",
                path.display()
            )));
        }
        let data = fs::read(path)?;
        let source = path.to_string_lossy().into_owned();
        self.register_bytes(data, Some(&source))
    }

    pub fn register_bytes(&mut self, data: Vec<u8>, source_name: Option<&str>) -> Result<String> {
        let source = source_name.unwrap_or("EmbeddedFont");
        let Ok(face) = ttf_parser::Face::parse(&data, 0) else {
            return Err(ReportError::InvalidConfiguration(format!(
                "invalid font data for {source}"
            )));
        };
        let (name, aliases) = face_names(&face, Path::new(source));
        let metrics = FontMetrics::from_face(&face);
        drop(face);

        let index = self.fonts.len();
        self.fonts.push(RegisteredFont {
            name: name.clone(),
            data,
            metrics,
        });
        for alias in std::iter::once(name.clone()).chain(aliases) {
            let key = normalize_name(&alias);
            if key.is_empty() || self.lookup.contains_key(&key) {
                continue;
            }
            self.lookup.insert(key, index);
        }
        Ok(name)
    }

    /// Advance width of `text` in the named font, or `None` when the font is
    /// not registered.
    pub fn measure_text_width(&self, name: &str, font_size: Pt, text: &str) -> Option<Pt> {
        let index = self.lookup.get(&normalize_name(name)).copied()?;
        let font = self.fonts.get(index)?;
        let cache_key = TextWidthKey {
            font_index: index,
            size_milli: font_size.to_milli_i64(),
            text: text.to_string(),
        };
        if let Ok(cache) = self.text_width_cache.lock() {
            if let Some(value) = cache.get(&cache_key) {
                return Some(value);
            }
        }
        let value = if font.metrics.is_within_latin1(text) {
            font.metrics.measure_text_width(font_size, text)
        } else {
            measure_text_width_shaped(font, font_size, text)
                .unwrap_or_else(|| font.metrics.measure_text_width(font_size, text))
        };
        if let Ok(mut cache) = self.text_width_cache.lock() {
            cache.insert(cache_key, value);
        }
        Some(value)
    }

    /// Primary names of the registered fonts, in registration order.
    pub fn font_names(&self) -> Vec<&str> {
        self.fonts.iter().map(|font| font.name.as_str()).collect()
    }
}

impl FontMetrics {
    fn from_face(face: &ttf_parser::Face<'_>) -> Self {
        let units_per_em = face.units_per_em().max(1);
        let scale = 1000.0 / units_per_em as f32;
        let first_char = 32u8;
        let last_char = 255u8;
        let glyph_ids: Vec<u16> = (first_char..=last_char)
            .map(|code| {
                char::from_u32(code as u32)
                    .and_then(|ch| face.glyph_index(ch))
                    .map(|gid| gid.0)
                    .unwrap_or(0)
            })
            .collect();
        let widths: Vec<u16> = glyph_ids
            .iter()
            .map(|gid| {
                let advance = face.glyph_hor_advance(GlyphId(*gid)).unwrap_or(0);
                let scaled = (advance as f32 * scale).round() as i32;
                scaled.clamp(0, u16::MAX as i32) as u16
            })
            .collect();
        let missing_width = widths.first().copied().unwrap_or(0);

        Self {
            first_char,
            last_char,
            kerning: build_kerning_pairs(face, &glyph_ids, scale),
            widths,
            glyph_ids,
            missing_width,
        }
    }

    fn index_of(&self, ch: char) -> Option<usize> {
        let code = ch as u32;
        if code < self.first_char as u32 || code > self.last_char as u32 {
            return None;
        }
        Some((code - self.first_char as u32) as usize)
    }

    fn measure_text_width(&self, font_size: Pt, text: &str) -> Pt {
        let mut total_units: i32 = 0;
        let mut prev: Option<u16> = None;
        for ch in text.chars() {
            let idx = self.index_of(ch);
            let gid = idx
                .and_then(|i| self.glyph_ids.get(i).copied())
                .unwrap_or(0);
            let adv = idx
                .and_then(|i| self.widths.get(i).copied())
                .unwrap_or(self.missing_width);
            total_units = total_units.saturating_add(adv as i32);
            if let Some(k) = prev.and_then(|p| self.kerning.get(&(p, gid))) {
                total_units = total_units.saturating_add(*k as i32);
            }
            prev = Some(gid);
        }
        if total_units <= 0 {
            return Pt::ZERO;
        }
        font_size.mul_ratio(total_units, 1000)
    }

    fn is_within_latin1(&self, text: &str) -> bool {
        text.chars().all(|ch| self.index_of(ch).is_some())
    }
}

fn build_kerning_pairs(
    face: &ttf_parser::Face<'_>,
    glyph_ids: &[u16],
    scale: f32,
) -> HashMap<(u16, u16), i16> {
    let mut out = HashMap::new();
    let Some(kern) = face.tables().kern else {
        return out;
    };
    let subtables: Vec<_> = kern
        .subtables
        .into_iter()
        .filter(|s| s.horizontal && !s.has_cross_stream && !s.has_state_machine)
        .collect();
    if subtables.is_empty() {
        return out;
    }

    for &left in glyph_ids.iter().filter(|gid| **gid != 0) {
        for &right in glyph_ids.iter().filter(|gid| **gid != 0) {
            let total: i32 = subtables
                .iter()
                .filter_map(|sub| sub.glyphs_kerning(GlyphId(left), GlyphId(right)))
                .map(i32::from)
                .sum();
            if total == 0 {
                continue;
            }
            let clamped = total.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
            let scaled = scale_i16(clamped, scale);
            if scaled != 0 {
                out.insert((left, right), scaled);
            }
        }
    }
    out
}

fn measure_text_width_shaped(font: &RegisteredFont, font_size: Pt, text: &str) -> Option<Pt> {
    let face = HbFace::from_slice(&font.data, 0)?;
    let units_per_em = face.units_per_em().max(1) as i64;

    let mut buffer = UnicodeBuffer::new();
    buffer.set_direction(detect_direction(text));
    buffer.push_str(text);
    let output = rustybuzz::shape(&face, &[], buffer);
    let positions = output.glyph_positions();
    if positions.is_empty() {
        return None;
    }
    let total_units: i32 = positions
        .iter()
        .map(|pos| (((pos.x_advance as i64) * 1000 + (units_per_em / 2)) / units_per_em) as i32)
        .fold(0i32, i32::saturating_add);
    if total_units <= 0 {
        return Some(Pt::ZERO);
    }
    Some(font_size.mul_ratio(total_units, 1000))
}

fn detect_direction(text: &str) -> HbDirection {
    let rtl = text.chars().any(|ch| {
        matches!(
            ch as u32,
            0x0590..=0x08FF | 0xFB1D..=0xFDFF | 0xFE70..=0xFEFF | 0x1EE00..=0x1EEFF
        )
    });
    if rtl {
        HbDirection::RightToLeft
    } else {
        HbDirection::LeftToRight
    }
}

fn scale_i16(value: i16, scale: f32) -> i16 {
    let scaled = (value as f32 * scale).round() as i32;
    scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn face_names(face: &ttf_parser::Face<'_>, path: &Path) -> (String, Vec<String>) {
    use ttf_parser::name::name_id;

    let mut family = None;
    let mut full = None;
    let mut post = None;
    for entry in face.names() {
        let Some(name) = entry.to_string() else {
            continue;
        };
        let slot = match entry.name_id {
            name_id::TYPOGRAPHIC_FAMILY | name_id::FAMILY => &mut family,
            name_id::FULL_NAME => &mut full,
            name_id::POST_SCRIPT_NAME => &mut post,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(name);
        }
    }

    let stem = path
        .file_stem()
        .and_then(|v| v.to_str())
        .map(|v| v.to_string());
    let primary = post
        .clone()
        .or_else(|| full.clone())
        .or_else(|| family.clone())
        .or_else(|| stem.clone())
        .unwrap_or_else(|| "EmbeddedFont".to_string());
    let aliases = [family, full, post, stem]
        .into_iter()
        .flatten()
        .filter(|candidate| *candidate != primary)
        .collect();
    (primary, aliases)
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|v| v.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf"))
        .unwrap_or(false)
}

fn normalize_name(name: &str) -> String {
    name.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn repo_font_path(file_name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fonts")
            .join(file_name)
    }

    fn serif_registry() -> FontRegistry {
        let mut registry = FontRegistry::new();
        registry
            .register_file(repo_font_path("DejaVuSerif.ttf"))
            .expect("register font");
        registry
    }

    fn width_milli(registry: &FontRegistry, name: &str, text: &str) -> i64 {
        registry
            .measure_text_width(name, Pt::from_i32(10), text)
            .expect("registered font")
            .to_milli_i64()
    }

    #[test]
    fn registered_font_resolves_by_every_name() {
        let registry = serif_registry();
        assert_eq!(registry.font_names(), vec!["DejaVuSerif"]);
        let by_post = width_milli(&registry, "DejaVuSerif", "Hello");
        assert_eq!(width_milli(&registry, "DejaVu Serif", "Hello"), by_post);
        assert_eq!(width_milli(&registry, "'dejavu serif'", "Hello"), by_post);
        assert!(
            registry
                .measure_text_width("DejaVu Sans", Pt::from_i32(10), "Hello")
                .is_none()
        );
    }

    #[test]
    fn latin1_widths_come_from_hmtx_and_kern() {
        let registry = serif_registry();
        // 1479 of 2048 units per em.
        assert_eq!(width_milli(&registry, "DejaVuSerif", "A"), 7_220);
        assert_eq!(width_milli(&registry, "DejaVuSerif", "V"), 7_220);
        // Kern pairs: A/V is -102 units, V/A is -139.
        assert_eq!(width_milli(&registry, "DejaVuSerif", "AV"), 13_940);
        assert_eq!(width_milli(&registry, "DejaVuSerif", "VA"), 13_760);
        assert_eq!(width_milli(&registry, "DejaVuSerif", "A V"), 7_220 * 2 + 3_180);
    }

    #[test]
    fn text_outside_latin1_is_shaped() {
        let registry = serif_registry();
        let greek = width_milli(&registry, "DejaVuSerif", "\u{3a9}\u{3c9}");
        assert!((15_500..=17_500).contains(&greek), "{greek}");
        assert_eq!(width_milli(&registry, "DejaVuSerif", "\u{3a9}\u{3c9}"), greek);
        assert_eq!(width_milli(&serif_registry(), "DejaVuSerif", "\u{3a9}\u{3c9}"), greek);
    }

    #[test]
    fn cached_widths_match_fresh_measurements() {
        let registry = serif_registry();
        let first = width_milli(&registry, "DejaVuSerif", "Market positioning");
        let cached = width_milli(&registry, "DejaVuSerif", "Market positioning");
        let fresh = width_milli(&serif_registry(), "DejaVuSerif", "Market positioning");
        assert_eq!(first, cached);
        assert_eq!(first, fresh);
    }

    #[test]
    fn register_dir_skips_files_that_are_not_fonts() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!("pitchpress_fonts_{}_{nanos}", std::process::id()));
        fs::create_dir_all(&dir).expect("create dir");
        fs::copy(repo_font_path("DejaVuSerif.ttf"), dir.join("DejaVuSerif.ttf")).expect("copy font");
        fs::write(dir.join("broken.ttf"), b"not a font").expect("write broken");
        fs::write(dir.join("notes.txt"), b"hello").expect("write notes");

        let mut registry = FontRegistry::new();
        assert_eq!(registry.register_dir(&dir).expect("register dir"), 1);
        assert_eq!(registry.font_names(), vec!["DejaVuSerif"]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unregistered_font_is_not_measured() {
        let registry = FontRegistry::new();
        assert!(registry.is_empty());
        assert!(
            registry
                .measure_text_width("Helvetica", Pt::from_i32(12), "abc")
                .is_none()
        );
        assert!(registry.font_names().is_empty());
    }

    #[test]
    fn invalid_font_bytes_are_rejected() {
        let mut registry = FontRegistry::new();
        let err = registry
            .register_bytes(vec![0, 1, 2, 3], Some("broken.ttf"))
            .expect_err("garbage is not a font");
        assert!(err.to_string().contains("broken.ttf"));
        assert!(registry.is_empty());
    }

    #[test]
    fn non_font_paths_are_rejected_before_reading() {
        let mut registry = FontRegistry::new();
        let err = registry
            .register_file("/definitely/missing/notes.txt")
            .expect_err("extension check");
        assert!(matches!(err, ReportError::InvalidConfiguration(_)));
    }

    #[test]
    fn width_cache_evicts_oldest_entries() {
        let mut cache = TextWidthCache::new(2);
        let key = |text: &str| TextWidthKey {
            font_index: 0,
            size_milli: 12_000,
            text: text.to_string(),
        };
        cache.insert(key("a"), Pt::from_i32(1));
        cache.insert(key("b"), Pt::from_i32(2));
        cache.insert(key("c"), Pt::from_i32(3));
        assert!(cache.get(&key("a")).is_none());
        assert_eq!(cache.get(&key("c")), Some(Pt::from_i32(3)));
    }

    #[test]
    fn normalize_name_strips_quotes_and_case() {
        assert_eq!(normalize_name(" 'Inter Bold' "), "inter bold");
        assert_eq!(normalize_name("\"DejaVu Sans\""), "dejavu sans");
    }
}
