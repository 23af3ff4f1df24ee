//! Class registry: one stable descriptor per distinct category name.
//!
//! Colors are drawn from a seeded generator, so the same sequence of names
//! always produces the same colors. Each new color is distinct from every
//! color already issued by the registry, including colors loaded from an
//! existing project meta file.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ir::io_ann_json::{MetaClass, MetaTag, ProjectMeta, ANY_SHAPE, ANY_STRING};
use crate::ir::{ClassDescriptor, Rgb, TagMeta};

/// Seed used when the caller does not pick one.
pub const DEFAULT_COLOR_SEED: u64 = 0x00c0_c05e;

/// Preferred minimum RGB distance between two issued colors.
const MIN_COLOR_DISTANCE: f64 = 64.0;

/// Random draws tried before settling for the most distant candidate.
const COLOR_ATTEMPTS: usize = 32;

/// Registry of class descriptors and tag declarations for one project.
#[derive(Debug)]
pub struct ClassRegistry {
    classes: Vec<ClassDescriptor>,
    by_name: HashMap<String, usize>,
    tags: Vec<TagMeta>,
    rng: StdRng,
    dirty: bool,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_COLOR_SEED)
    }
}

impl ClassRegistry {
    /// Creates an empty registry.
    pub fn new(seed: u64) -> Self {
        Self {
            classes: Vec::new(),
            by_name: HashMap::new(),
            tags: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            dirty: false,
        }
    }

    /// Restores a registry from a project meta file, keeping its colors.
    ///
    /// A repeated class title keeps its first entry.
    pub fn from_meta(meta: &ProjectMeta, seed: u64) -> Self {
        let mut registry = Self::new(seed);
        for class in &meta.classes {
            if registry.by_name.contains_key(&class.title) {
                log::warn!("project meta declares class '{}' twice", class.title);
                continue;
            }
            registry.insert(ClassDescriptor {
                name: class.title.clone(),
                color: class.color,
            });
        }
        for tag in &meta.tags {
            if registry.tag(&tag.name).is_none() {
                registry.tags.push(TagMeta {
                    name: tag.name.clone(),
                });
            }
        }
        registry.dirty = false;
        registry
    }

    /// Returns the descriptor for `name`, creating it with a fresh color if
    /// the name has not been seen.
    pub fn ensure(&mut self, name: &str) -> &ClassDescriptor {
        let idx = match self.by_name.get(name) {
            Some(&idx) => idx,
            None => {
                let color = self.next_color();
                log::debug!("registering class '{name}' with color {color}");
                self.insert(ClassDescriptor {
                    name: name.to_string(),
                    color,
                })
            }
        };
        &self.classes[idx]
    }

    /// Returns the tag declaration for `name`, creating it if needed.
    pub fn ensure_tag(&mut self, name: &str) -> &TagMeta {
        let idx = match self.tags.iter().position(|t| t.name == name) {
            Some(idx) => idx,
            None => {
                self.tags.push(TagMeta {
                    name: name.to_string(),
                });
                self.dirty = true;
                self.tags.len() - 1
            }
        };
        &self.tags[idx]
    }

    pub fn get(&self, name: &str) -> Option<&ClassDescriptor> {
        self.by_name.get(name).map(|&idx| &self.classes[idx])
    }

    pub fn tag(&self, name: &str) -> Option<&TagMeta> {
        self.tags.iter().find(|t| t.name == name)
    }

    /// Descriptors in registration order.
    pub fn classes(&self) -> &[ClassDescriptor] {
        &self.classes
    }

    pub fn tags(&self) -> &[TagMeta] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Returns true if classes or tags were added since creation or loading.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Builds the project meta document for this registry.
    pub fn to_meta(&self) -> ProjectMeta {
        ProjectMeta {
            classes: self
                .classes
                .iter()
                .map(|c| MetaClass {
                    title: c.name.clone(),
                    shape: ANY_SHAPE.to_string(),
                    color: c.color,
                })
                .collect(),
            tags: self
                .tags
                .iter()
                .map(|t| MetaTag {
                    name: t.name.clone(),
                    value_type: ANY_STRING.to_string(),
                })
                .collect(),
        }
    }

    fn insert(&mut self, descriptor: ClassDescriptor) -> usize {
        let idx = self.classes.len();
        self.by_name.insert(descriptor.name.clone(), idx);
        self.classes.push(descriptor);
        self.dirty = true;
        idx
    }

    /// Distance from `color` to the nearest issued color.
    fn nearest_distance(&self, color: &Rgb) -> f64 {
        self.classes
            .iter()
            .map(|c| c.color.distance(color))
            .fold(f64::INFINITY, f64::min)
    }

    fn next_color(&mut self) -> Rgb {
        let mut best: Option<(Rgb, f64)> = None;
        for _ in 0..COLOR_ATTEMPTS {
            let candidate = random_vivid(&mut self.rng);
            let distance = self.nearest_distance(&candidate);
            if distance >= MIN_COLOR_DISTANCE {
                return candidate;
            }
            if distance > 0.0 && best.map_or(true, |(_, d)| distance > d) {
                best = Some((candidate, distance));
            }
        }
        if let Some((color, _)) = best {
            return color;
        }
        // Every draw collided exactly; fall back to any unused color.
        loop {
            let candidate = Rgb::new(self.rng.gen(), self.rng.gen(), self.rng.gen());
            if self.nearest_distance(&candidate) > 0.0 {
                return candidate;
            }
        }
    }
}

/// Draws a saturated, bright color from HSV space.
fn random_vivid(rng: &mut StdRng) -> Rgb {
    let hue = rng.gen_range(0.0..360.0);
    let saturation = rng.gen_range(0.6..1.0);
    let value = rng.gen_range(0.7..1.0);
    hsv_to_rgb(hue, saturation, value)
}

fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> Rgb {
    let chroma = value * saturation;
    let sector = hue / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = value - chroma;
    let channel = |c: f64| ((c + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb::new(channel(r), channel(g), channel(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_is_idempotent() {
        let mut registry = ClassRegistry::default();
        let first = registry.ensure("cat").clone();
        let second = registry.ensure("cat").clone();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_colors_are_pairwise_distinct() {
        let mut registry = ClassRegistry::new(7);
        for i in 0..200 {
            registry.ensure(&format!("class-{i}"));
        }
        let colors: Vec<Rgb> = registry.classes().iter().map(|c| c.color).collect();
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_same_seed_same_colors() {
        let mut a = ClassRegistry::new(42);
        let mut b = ClassRegistry::new(42);
        for name in ["person", "car", "dog"] {
            assert_eq!(a.ensure(name).color, b.ensure(name).color);
        }
    }

    #[test]
    fn test_registration_order_is_kept() {
        let mut registry = ClassRegistry::default();
        registry.ensure("b");
        registry.ensure("a");
        registry.ensure("b");
        let names: Vec<&str> = registry.classes().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_meta_roundtrip_keeps_colors_and_is_clean() {
        let mut registry = ClassRegistry::default();
        registry.ensure("person");
        registry.ensure("car");
        registry.ensure_tag("caption");
        let meta = registry.to_meta();

        let restored = ClassRegistry::from_meta(&meta, 99);
        assert!(!restored.is_dirty());
        assert_eq!(restored.classes(), registry.classes());
        assert_eq!(restored.tag("caption").map(|t| t.name.as_str()), Some("caption"));
    }

    #[test]
    fn test_new_class_after_loading_avoids_loaded_colors() {
        let meta = ProjectMeta {
            classes: vec![MetaClass {
                title: "person".to_string(),
                shape: ANY_SHAPE.to_string(),
                color: Rgb::new(255, 0, 0),
            }],
            tags: Vec::new(),
        };
        let mut registry = ClassRegistry::from_meta(&meta, 1);
        assert_eq!(registry.ensure("person").color, Rgb::new(255, 0, 0));
        assert!(!registry.is_dirty());

        let car = registry.ensure("car").color;
        assert_ne!(car, Rgb::new(255, 0, 0));
        assert!(registry.is_dirty());
    }

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), Rgb::new(255, 0, 0));
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), Rgb::new(0, 255, 0));
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), Rgb::new(0, 0, 255));
    }
}
