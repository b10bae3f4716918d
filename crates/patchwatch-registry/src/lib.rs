//! Static widget schema registry for Pure Data GUI objects.
//!
//! Pd stores IEM GUI objects (bangs, toggles, sliders, ...) as a flat list of
//! positional atoms. This crate maps each widget type name to the ordered list
//! of field names those atoms stand for, so a patch reader can turn
//! `#X obj 10 10 bng 15 250 50 0 empty empty empty 17 7 0 10 -262144 -1 -1`
//! into named fields.
//!
//! # Features
//!
//! - **Static table**: every schema is registered once in [`WidgetRegistry::new`]
//! - **Aliases**: `hradio`/`vdl`/`vradio` share the `hdl` schema, the slider
//!   family shares `hsl`
//! - **Decoding**: [`WidgetRegistry::decode`] zips object atoms with a schema
//!
//! # Example
//!
//! ```rust
//! use patchwatch_registry::WidgetRegistry;
//!
//! let registry = WidgetRegistry::new();
//! let atoms = ["10", "20", "tgl", "15", "0", "empty", "empty"];
//! let widget = registry.decode("tgl", &atoms).unwrap();
//! assert_eq!(widget.get("size"), Some("15"));
//! assert_eq!(widget.get("label"), None);
//! ```

use std::fmt;

/// Broad family a widget belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetCategory {
    /// Momentary bang button.
    Button,
    /// Two-state toggle.
    Toggle,
    /// Numeric entry box.
    NumberBox,
    /// Row of radio buttons.
    Radio,
    /// Continuous slider.
    Slider,
    /// Level meter.
    Meter,
}

impl WidgetCategory {
    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            WidgetCategory::Button => "Button",
            WidgetCategory::Toggle => "Toggle",
            WidgetCategory::NumberBox => "Number Box",
            WidgetCategory::Radio => "Radio",
            WidgetCategory::Slider => "Slider",
            WidgetCategory::Meter => "Meter",
        }
    }
}

/// Describes one widget schema in the registry.
#[derive(Debug, Clone)]
pub struct WidgetDescriptor {
    /// Canonical Pd class name (e.g. `"bng"`).
    pub id: &'static str,
    /// Other class names sharing this schema.
    pub aliases: &'static [&'static str],
    /// Human-readable name.
    pub name: &'static str,
    /// Category for organization.
    pub category: WidgetCategory,
    /// Ordered field names, one per positional atom.
    pub fields: &'static [&'static str],
}

impl WidgetDescriptor {
    /// Returns true if `class` is this widget's id or one of its aliases.
    pub fn answers_to(&self, class: &str) -> bool {
        self.id == class || self.aliases.iter().any(|alias| *alias == class)
    }
}

const BNG_FIELDS: &[&str] = &[
    "x_pos",
    "y_pos",
    "name",
    "size",
    "hold",
    "interrupt",
    "init",
    "send",
    "receive",
    "label",
    "x_off",
    "y_off",
    "font",
    "fontsize",
    "bg_color",
    "fg_color",
    "label_color",
];

const TGL_FIELDS: &[&str] = &[
    "x_pos",
    "y_pos",
    "name",
    "size",
    "init",
    "send",
    "receive",
    "label",
    "x_off",
    "y_off",
    "font",
    "fontsize",
    "bg_color",
    "fg_color",
    "label_color",
    "init_value",
    "default_value",
];

const NBX_FIELDS: &[&str] = &[
    "x_pos",
    "y_pos",
    "name",
    "size",
    "height",
    "min",
    "max",
    "log",
    "init",
    "send",
    "receive",
    "label",
    "x_off",
    "y_off",
    "font",
    "fontsize",
    "bg_color",
    "fg_color",
    "label_color",
    "log_height",
];

const HDL_FIELDS: &[&str] = &[
    "x_pos",
    "y_pos",
    "name",
    "size",
    "new_old",
    "init",
    "number",
    "send",
    "receive",
    "label",
    "x_off",
    "y_off",
    "font",
    "fontsize",
    "bg_color",
    "fg_color",
    "label_color",
    "default_value",
];

const HSL_FIELDS: &[&str] = &[
    "x_pos",
    "y_pos",
    "name",
    "width",
    "height",
    "bottom",
    "top",
    "log",
    "init",
    "send",
    "receive",
    "label",
    "x_off",
    "y_off",
    "font",
    "fontsize",
    "bg_color",
    "fg_color",
    "label_color",
    "default_value",
    "steady_on_click",
];

const VU_FIELDS: &[&str] = &[
    "x_pos",
    "y_pos",
    "name",
    "width",
    "height",
    "receive",
    "label",
    "x_off",
    "y_off",
    "font",
    "fontsize",
    "bg_color",
    "label_color",
    "scale",
    "unused",
];

/// Registry of all known widget schemas.
///
/// Populated once at construction; lookups are by class name or alias.
#[derive(Debug)]
pub struct WidgetRegistry {
    entries: Vec<WidgetDescriptor>,
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetRegistry {
    /// Create a new registry with all built-in widget schemas registered.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(6),
        };
        registry.register_builtin_widgets();
        registry
    }

    /// Register all built-in widgets.
    fn register_builtin_widgets(&mut self) {
        self.register(WidgetDescriptor {
            id: "bng",
            aliases: &[],
            name: "Bang",
            category: WidgetCategory::Button,
            fields: BNG_FIELDS,
        });

        self.register(WidgetDescriptor {
            id: "tgl",
            aliases: &[],
            name: "Toggle",
            category: WidgetCategory::Toggle,
            fields: TGL_FIELDS,
        });

        self.register(WidgetDescriptor {
            id: "nbx",
            aliases: &[],
            name: "Number Box",
            category: WidgetCategory::NumberBox,
            fields: NBX_FIELDS,
        });

        // Vertical radios store the same atoms as horizontal ones
        self.register(WidgetDescriptor {
            id: "hdl",
            aliases: &["hradio", "vdl", "vradio"],
            name: "Radio",
            category: WidgetCategory::Radio,
            fields: HDL_FIELDS,
        });

        self.register(WidgetDescriptor {
            id: "hsl",
            aliases: &["hslider", "vsl", "vslider"],
            name: "Slider",
            category: WidgetCategory::Slider,
            fields: HSL_FIELDS,
        });

        self.register(WidgetDescriptor {
            id: "vu",
            aliases: &[],
            name: "VU Meter",
            category: WidgetCategory::Meter,
            fields: VU_FIELDS,
        });
    }

    /// Register a widget schema with the registry.
    fn register(&mut self, descriptor: WidgetDescriptor) {
        self.entries.push(descriptor);
    }

    /// Returns descriptors for all registered widgets.
    pub fn all_widgets(&self) -> Vec<&WidgetDescriptor> {
        self.entries.iter().collect()
    }

    /// Returns descriptors for widgets in a specific category.
    pub fn widgets_in_category(&self, category: WidgetCategory) -> Vec<&WidgetDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .collect()
    }

    /// Get a descriptor by class name or alias.
    pub fn get(&self, class: &str) -> Option<&WidgetDescriptor> {
        self.entries.iter().find(|e| e.answers_to(class))
    }

    /// Returns true if `class` names a registered widget.
    pub fn contains(&self, class: &str) -> bool {
        self.get(class).is_some()
    }

    /// Decode an object's atoms against the schema for `class`.
    ///
    /// `atoms` are the object's arguments as stored in the patch file, starting
    /// with its canvas position (`x y class ...`). Atoms beyond the schema are
    /// kept in [`Widget::overflow`]; missing trailing atoms leave their fields
    /// absent.
    ///
    /// Returns `None` if `class` is not a registered widget.
    pub fn decode<S: AsRef<str>>(&self, class: &str, atoms: &[S]) -> Option<Widget> {
        let descriptor = self.get(class)?;
        let values = descriptor
            .fields
            .iter()
            .zip(atoms)
            .map(|(&field, atom)| (field, atom.as_ref().to_string()))
            .collect();
        let overflow = atoms
            .iter()
            .skip(descriptor.fields.len())
            .map(|a| a.as_ref().to_string())
            .collect();
        Some(Widget {
            id: descriptor.id,
            class: class.to_string(),
            values,
            overflow,
        })
    }

    /// Returns the number of registered widget schemas.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no widgets are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A widget object decoded into named fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    /// Canonical schema id the atoms were decoded with.
    pub id: &'static str,
    /// Class name as written in the patch (may be an alias).
    pub class: String,
    /// `(field, value)` pairs in schema order.
    pub values: Vec<(&'static str, String)>,
    /// Atoms past the end of the schema.
    pub overflow: Vec<String>,
}

impl Widget {
    /// Look up a field value by name.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Send symbol, unless it is Pd's `empty` placeholder.
    pub fn send_symbol(&self) -> Option<&str> {
        self.get("send").filter(|s| *s != "empty")
    }

    /// Receive symbol, unless it is Pd's `empty` placeholder.
    pub fn receive_symbol(&self) -> Option<&str> {
        self.get("receive").filter(|s| *s != "empty")
    }
}

impl fmt::Display for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object {} with args:", self.class)?;
        for (field, value) in &self.values {
            write!(f, "\n    {field}: {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atoms(line: &str) -> Vec<&str> {
        line.split_whitespace().collect()
    }

    #[test]
    fn test_registry_creation() {
        let registry = WidgetRegistry::new();
        assert_eq!(registry.len(), 6);
        assert!(!registry.is_empty());
    }

    #[test]
    fn registry_debug_lists_schemas() {
        let text = format!("{:?}", WidgetRegistry::new());
        assert!(text.starts_with("WidgetRegistry"));
        assert!(text.contains("hsl"));
    }

    #[test]
    fn test_get_by_alias() {
        let registry = WidgetRegistry::new();

        for alias in ["hslider", "vsl", "vslider"] {
            assert_eq!(registry.get(alias).unwrap().id, "hsl");
        }
        for alias in ["hradio", "vdl", "vradio"] {
            assert_eq!(registry.get(alias).unwrap().id, "hdl");
        }
        assert!(registry.get("osc~").is_none());
    }

    #[test]
    fn test_widgets_by_category() {
        let registry = WidgetRegistry::new();
        assert_eq!(registry.widgets_in_category(WidgetCategory::Slider).len(), 1);
        assert_eq!(registry.widgets_in_category(WidgetCategory::Meter).len(), 1);
    }

    #[test]
    fn test_schemas_start_with_position_and_name() {
        let registry = WidgetRegistry::new();
        for descriptor in registry.all_widgets() {
            assert_eq!(
                &descriptor.fields[..3],
                &["x_pos", "y_pos", "name"],
                "schema {} should start with position and class",
                descriptor.id
            );
        }
    }

    #[test]
    fn test_decode_bang() {
        let registry = WidgetRegistry::new();
        let line = "10 20 bng 15 250 50 0 empty bang-in empty 17 7 0 10 -262144 -1 -1";
        let widget = registry.decode("bng", &atoms(line)).unwrap();

        assert_eq!(widget.id, "bng");
        assert_eq!(widget.get("x_pos"), Some("10"));
        assert_eq!(widget.get("hold"), Some("250"));
        assert_eq!(widget.get("label_color"), Some("-1"));
        assert_eq!(widget.send_symbol(), None);
        assert_eq!(widget.receive_symbol(), Some("bang-in"));
        assert!(widget.overflow.is_empty());
    }

    #[test]
    fn test_decode_short_and_long_atom_lists() {
        let registry = WidgetRegistry::new();

        let short = registry.decode("tgl", &atoms("1 2 tgl 15")).unwrap();
        assert_eq!(short.values.len(), 4);
        assert_eq!(short.get("init"), None);

        let mut long = atoms("1 2 vu 15 120 empty empty -1 -8 0 10 -66577 -1 1 0");
        long.push("extra");
        let vu = registry.decode("vu", &long).unwrap();
        assert_eq!(vu.overflow, vec!["extra".to_string()]);
    }

    #[test]
    fn test_decode_alias_keeps_class() {
        let registry = WidgetRegistry::new();
        let widget = registry
            .decode("vslider", &atoms("5 5 vslider 15 128 0 127 0 0 empty empty"))
            .unwrap();
        assert_eq!(widget.id, "hsl");
        assert_eq!(widget.class, "vslider");
        assert_eq!(widget.get("top"), Some("127"));
    }

    #[test]
    fn test_decode_unknown_class() {
        let registry = WidgetRegistry::new();
        assert!(registry.decode("metro", &atoms("1 2 metro 100")).is_none());
    }

    #[test]
    fn test_display_lists_fields() {
        let registry = WidgetRegistry::new();
        let widget = registry.decode("nbx", &atoms("1 2 nbx 5")).unwrap();
        let text = widget.to_string();
        assert!(text.starts_with("Object nbx with args:"));
        assert!(text.contains("    size: 5"));
    }
}
