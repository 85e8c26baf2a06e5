//! Layout overrides: presentation hints layered over a section schema
//!
//! The engine walks a schema and produces a [`LayoutHints`] tree with the same
//! nesting (object properties, array `items`, `additionalProperties`). Hints
//! only choose widgets, column spans and label placement; the schema is taken
//! by shared reference and never changed.
//!
//! Rules are matched by path suffix, so a rule for
//! `DEBUG_OPTIONS.BUILD_TYPE` applies whether the form root is the
//! `DEBUG_OPTIONS` section itself or a group that contains it.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde_json::{json, Map, Value};

/// Limit on `$ref` chains and nesting while walking a schema
const MAX_DEPTH: usize = 64;

/// Widget a form field is rendered with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WidgetKind {
    /// Whatever the renderer picks for the schema type
    #[default]
    Default,
    /// Radio group for enumerations
    Radio,
    /// Not rendered
    Hidden,
    /// Drop-down of known VM names, unique within a region
    VmNameSelector,
    /// Free text committed only as a well-formed, unique BDF
    BdfTextField,
}

impl WidgetKind {
    /// Name the renderer registers the widget under
    #[must_use]
    pub fn ui_name(self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            Self::Radio => Some("radio"),
            Self::Hidden => Some("hidden"),
            Self::VmNameSelector => Some("VM_NAME"),
            Self::BdfTextField => Some("VBDF"),
        }
    }
}

/// Placement of a field's description label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelAlign {
    /// Beside the field
    Horizontal,
    /// Above the field
    Vertical,
}

impl LabelAlign {
    fn ui_code(self) -> &'static str {
        match self {
            Self::Horizontal => "H",
            Self::Vertical => "V",
        }
    }
}

/// Hints attached to one schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeHint {
    /// Widget choice
    pub widget: WidgetKind,
    /// Column span in a 12-column grid
    pub grid: Option<u8>,
    /// Description label placement; `None` keeps the default label
    pub desc_label: Option<LabelAlign>,
}

impl NodeHint {
    /// Hint selecting a widget
    #[inline]
    #[must_use]
    pub fn widget(widget: WidgetKind) -> Self {
        Self {
            widget,
            ..Self::default()
        }
    }

    /// With a column span
    #[inline]
    #[must_use]
    pub fn with_grid(mut self, grid: u8) -> Self {
        self.grid = Some(grid);
        self
    }

    /// With a description label placement
    #[inline]
    #[must_use]
    pub fn with_desc_label(mut self, align: LabelAlign) -> Self {
        self.desc_label = Some(align);
        self
    }

    /// Check if this hint changes nothing
    #[inline]
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// One step in a schema path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object property
    Key(String),
    /// Array element schema
    Items,
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Items => f.write_str("[]"),
        }
    }
}

/// Hint applied to every node whose path ends with `path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRule {
    path: Vec<PathSegment>,
    hint: NodeHint,
}

impl LayoutRule {
    /// Create a rule from a dotted path
    ///
    /// `[]` after a key steps into that array's items:
    /// `IVSHMEM_REGION[].IVSHMEM_VMS` is `IVSHMEM_REGION`, items, `IVSHMEM_VMS`.
    #[must_use]
    pub fn new(path: &str, hint: NodeHint) -> Self {
        Self {
            path: parse_path(path),
            hint,
        }
    }

    /// Rule path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    fn matches(&self, path: &[PathSegment]) -> bool {
        !self.path.is_empty() && path.ends_with(&self.path)
    }
}

fn parse_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    for part in path.split('.').filter(|p| !p.is_empty()) {
        let mut key = part;
        let mut items = 0;
        while let Some(stripped) = key.strip_suffix("[]") {
            key = stripped;
            items += 1;
        }
        if !key.is_empty() {
            segments.push(PathSegment::Key(key.to_string()));
        }
        segments.extend(std::iter::repeat(PathSegment::Items).take(items));
    }
    segments
}

/// Presentation hints mirroring a schema's shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutHints {
    /// Hint for this node
    pub hint: NodeHint,
    /// Hints for declared object properties
    pub properties: BTreeMap<String, LayoutHints>,
    /// Hints for array elements
    pub items: Option<Box<LayoutHints>>,
    /// Hints for properties matched only by `additionalProperties`
    pub additional: Option<Box<LayoutHints>>,
}

impl LayoutHints {
    /// Hints for a declared property
    #[inline]
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&LayoutHints> {
        self.properties.get(key)
    }

    /// Walk a relative path
    #[must_use]
    pub fn get(&self, path: &[PathSegment]) -> Option<&LayoutHints> {
        path.iter().try_fold(self, |node, segment| match segment {
            PathSegment::Key(key) => node.properties.get(key),
            PathSegment::Items => node.items.as_deref(),
        })
    }

    /// Widget for a property key that is not declared in the schema
    ///
    /// Such keys fall under `additionalProperties`; with the default policy
    /// they are hidden.
    #[must_use]
    pub fn widget_for_key(&self, key: &str) -> WidgetKind {
        match self.properties.get(key) {
            Some(node) => node.hint.widget,
            None => self
                .additional
                .as_deref()
                .map_or(WidgetKind::Default, |node| node.hint.widget),
        }
    }

    /// Every non-default widget choice with its relative path
    #[must_use]
    pub fn widgets(&self) -> Vec<(Vec<PathSegment>, WidgetKind)> {
        let mut out = Vec::new();
        self.collect_widgets(&mut Vec::new(), &mut out);
        out
    }

    fn collect_widgets(&self, path: &mut Vec<PathSegment>, out: &mut Vec<(Vec<PathSegment>, WidgetKind)>) {
        if self.hint.widget != WidgetKind::Default {
            out.push((path.clone(), self.hint.widget));
        }
        for (key, child) in &self.properties {
            path.push(PathSegment::Key(key.clone()));
            child.collect_widgets(path, out);
            path.pop();
        }
        if let Some(items) = &self.items {
            path.push(PathSegment::Items);
            items.collect_widgets(path, out);
            path.pop();
        }
    }

    /// Check if no node in the tree carries a hint
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hint.is_default()
            && self.additional.is_none()
            && self.items.as_deref().map_or(true, LayoutHints::is_empty)
            && self.properties.values().all(LayoutHints::is_empty)
    }

    /// Render as a UI schema document for the form renderer
    ///
    /// Keys: `ui:widget`, `ui:grid`, `ui:descLabel`, `ui:descLabelAli`;
    /// children nest under their property name, `items` and
    /// `additionalProperties`. Branches without hints are omitted.
    #[must_use]
    pub fn to_ui_schema(&self) -> Value {
        let mut node = Map::new();

        if let Some(name) = self.hint.widget.ui_name() {
            node.insert("ui:widget".to_string(), json!(name));
        }
        if let Some(grid) = self.hint.grid {
            node.insert("ui:grid".to_string(), json!(grid));
        }
        if let Some(align) = self.hint.desc_label {
            node.insert("ui:descLabel".to_string(), json!(true));
            node.insert("ui:descLabelAli".to_string(), json!(align.ui_code()));
        }

        for (key, child) in &self.properties {
            if !child.is_empty() {
                node.insert(key.clone(), child.to_ui_schema());
            }
        }
        if let Some(items) = self.items.as_deref().filter(|i| !i.is_empty()) {
            node.insert("items".to_string(), items.to_ui_schema());
        }
        if let Some(additional) = &self.additional {
            node.insert("additionalProperties".to_string(), additional.to_ui_schema());
        }

        Value::Object(node)
    }
}

/// Builds [`LayoutHints`] for section schemas
#[derive(Debug, Clone)]
pub struct LayoutOverrideEngine {
    rules: Vec<LayoutRule>,
    hide_additional: bool,
}

impl Default for LayoutOverrideEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutOverrideEngine {
    /// Engine with the built-in rules and hidden additional properties
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Self::builtin_rules(),
            hide_additional: true,
        }
    }

    /// Engine with no rules
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            hide_additional: true,
        }
    }

    /// Built-in scenario form rules
    #[must_use]
    pub fn builtin_rules() -> Vec<LayoutRule> {
        const SLOT: &str = "IVSHMEM.IVSHMEM_REGION[].IVSHMEM_VMS.IVSHMEM_VM[]";
        vec![
            LayoutRule::new("DEBUG_OPTIONS.BUILD_TYPE", NodeHint::widget(WidgetKind::Radio)),
            LayoutRule::new(
                &format!("{SLOT}.VM_NAME"),
                NodeHint::widget(WidgetKind::VmNameSelector)
                    .with_grid(7)
                    .with_desc_label(LabelAlign::Horizontal),
            ),
            LayoutRule::new(
                &format!("{SLOT}.VBDF"),
                NodeHint::widget(WidgetKind::BdfTextField)
                    .with_grid(5)
                    .with_desc_label(LabelAlign::Vertical),
            ),
        ]
    }

    /// Add a rule; later rules win over earlier ones on the same node
    #[must_use]
    pub fn with_rule(mut self, rule: LayoutRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Set whether `additionalProperties` fields are hidden
    #[must_use]
    pub fn with_hide_additional(mut self, hide: bool) -> Self {
        self.hide_additional = hide;
        self
    }

    /// Build hints for the schema of `section`
    #[must_use]
    pub fn overrides_for(&self, section: &str, schema: &Value) -> LayoutHints {
        let mut path = vec![PathSegment::Key(section.to_string())];
        self.walk(schema, schema, &mut path, 0)
    }

    fn walk(&self, root: &Value, node: &Value, path: &mut Vec<PathSegment>, depth: usize) -> LayoutHints {
        let node = resolve_ref(root, node);
        let mut hints = LayoutHints {
            hint: self.hint_for(path),
            ..LayoutHints::default()
        };
        if depth >= MAX_DEPTH {
            return hints;
        }

        if let Some(properties) = node.get("properties").and_then(Value::as_object) {
            for (key, child) in properties {
                path.push(PathSegment::Key(key.clone()));
                let child_hints = self.walk(root, child, path, depth + 1);
                path.pop();
                hints.properties.insert(key.clone(), child_hints);
            }
        }

        if let Some(items) = node.get("items").filter(|i| i.is_object()) {
            path.push(PathSegment::Items);
            let item_hints = self.walk(root, items, path, depth + 1);
            path.pop();
            hints.items = Some(Box::new(item_hints));
        }

        let open = match node.get("additionalProperties") {
            Some(Value::Bool(allowed)) => *allowed,
            Some(Value::Object(_)) => true,
            _ => false,
        };
        if open && self.hide_additional {
            hints.additional = Some(Box::new(LayoutHints {
                hint: NodeHint::widget(WidgetKind::Hidden),
                ..LayoutHints::default()
            }));
        }

        hints
    }

    fn hint_for(&self, path: &[PathSegment]) -> NodeHint {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(path))
            .map(|rule| rule.hint)
            .unwrap_or_default()
    }
}

/// Follow local `$ref` pointers (`#/definitions/...`, `#/$defs/...`)
fn resolve_ref<'a>(root: &'a Value, mut node: &'a Value) -> &'a Value {
    for _ in 0..MAX_DEPTH {
        let Some(target) = node
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|r| r.strip_prefix('#'))
            .and_then(|pointer| root.pointer(pointer))
        else {
            break;
        };
        node = target;
    }
    node
}
