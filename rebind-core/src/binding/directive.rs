//! Directive bindings.
//!
//! A directive is a named attribute convention (`data-visible`, `on-click`,
//! `each`) mapped to a function. When the walker meets an element carrying
//! the attribute, it builds a [`Binding`] and runs the directive once with
//! the binding as receiver. The directive usually calls [`Binding::change`]
//! to render now and again whenever the attribute's paths change.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::{smallvec, SmallVec};
use tracing::trace;

use super::builtins;
use crate::dom::Node;
use crate::error::Result;
use crate::expr::{has_interpolation, interpolation_paths, Template};
use crate::model::Value;
use crate::reactive::{Handler, View, WeakView};

/// `(binding, element, attribute value, model)`.
pub type Directive = Rc<dyn Fn(&mut Binding, &Node, &str, &Value) -> Result<()>>;

/// Ordered registry of directives. Order decides which directive runs first
/// on an element carrying several.
#[derive(Clone, Default)]
pub struct Directives {
    entries: IndexMap<String, Directive>,
}

impl Directives {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in directives.
    pub fn builtin() -> Self {
        let mut directives = Self::new();
        builtins::install(&mut directives);
        directives
    }

    /// Register `name`, replacing an existing directive of that name in
    /// place.
    pub fn insert(&mut self, name: &str, directive: Directive) {
        self.entries.insert(name.to_string(), directive);
    }

    /// Builder form of [`Directives::insert`].
    pub fn with<F>(mut self, name: &str, directive: F) -> Self
    where
        F: Fn(&mut Binding, &Node, &str, &Value) -> Result<()> + 'static,
    {
        self.insert(name, Rc::new(directive));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Directive> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Directive)> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Directives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

/// One directive applied to one element.
#[derive(Clone)]
pub struct Binding {
    name: String,
    value: String,
    el: Node,
    view: WeakView,
    /// Set by the directive to keep the walker out of the element's subtree.
    pub skip: bool,
}

impl Binding {
    pub fn new(name: &str, view: &View, el: &Node, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            el: el.clone(),
            view: view.downgrade(),
            skip: false,
        }
    }

    /// Run `directive` with this binding as receiver.
    pub fn bind(&mut self, directive: &Directive) -> Result<()> {
        let el = self.el.clone();
        let value = self.value.clone();
        let model = self.view().map(|v| v.model().clone()).unwrap_or_default();
        directive(self, &el, &value, &model)
    }

    /// The directive name, which is also the attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attribute value as it was when the element was walked.
    pub fn attribute(&self) -> &str {
        &self.value
    }

    pub fn element(&self) -> &Node {
        &self.el
    }

    pub fn view(&self) -> Option<View> {
        self.view.upgrade()
    }

    pub fn weak_view(&self) -> WeakView {
        self.view.clone()
    }

    /// Read `path` from the view.
    pub fn value(&self, path: &str) -> Value {
        self.view().map(|v| v.get(path)).unwrap_or_default()
    }

    /// Render `text` as a template, or, without markers, read it as a path.
    pub fn interpolate(&self, text: &str) -> Result<String> {
        let Some(view) = self.view() else {
            return Ok(String::new());
        };
        if has_interpolation(text) {
            Template::compile(text)?.render(&view)
        } else {
            Ok(view.get(text).to_string())
        }
    }

    /// Run `render` now and whenever the attribute's paths change.
    ///
    /// With markers, every path they reference is watched; otherwise the
    /// attribute value itself is the path.
    pub fn change<F>(&self, render: F) -> Result<()>
    where
        F: Fn(&Binding) -> Result<()> + 'static,
    {
        render(self)?;

        let Some(view) = self.view() else {
            return Ok(());
        };
        let paths: SmallVec<[String; 4]> = if has_interpolation(&self.value) {
            interpolation_paths(&self.value)?
        } else if self.value.is_empty() {
            SmallVec::new()
        } else {
            smallvec![self.value.clone()]
        };

        trace!(target: "rebind", directive = %self.name, paths = ?paths, "watch");
        let render = Rc::new(render);
        for path in &paths {
            let binding = self.clone();
            let render = Rc::clone(&render);
            view.sub(path, Handler::new(move |_| render(&binding)));
        }
        Ok(())
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("skip", &self.skip)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_fragment;
    use crate::model::Object;
    use crate::reactive::ReactiveOptions;
    use std::cell::{Cell, RefCell};

    fn root(markup: &str) -> Node {
        parse_fragment(markup).unwrap().first_child().unwrap()
    }

    #[test]
    fn registry_keeps_order_and_replaces_in_place() {
        let noop = |_: &mut Binding, _: &Node, _: &str, _: &Value| Ok(());
        let mut directives = Directives::new().with("a", noop).with("b", noop);
        directives.insert("a", Rc::new(noop));

        assert_eq!(directives.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(directives.contains("b"));
        assert_eq!(directives.len(), 2);
    }

    #[test]
    fn builtin_registry_order() {
        let directives = Directives::builtin();
        let names: Vec<&str> = directives.names().collect();
        assert_eq!(names.first(), Some(&"each"));
        assert_eq!(names.last(), Some(&"data-replace"));
        assert!(directives.contains("data-href"));
        assert!(directives.contains("on-click"));
    }

    #[test]
    fn custom_directive_renders_and_rerenders() {
        let renders = Rc::new(Cell::new(0));
        let renders_clone = renders.clone();
        let directives = Directives::new().with("data-upper", move |binding, _, _, _| {
            let renders = renders_clone.clone();
            binding.change(move |b| {
                renders.set(renders.get() + 1);
                let text = b.value(b.attribute()).to_string().to_uppercase();
                b.element().set_text_content(&text);
                Ok(())
            })
        });

        let el = root(r#"<p data-upper="name"></p>"#);
        let view = View::new(
            el.clone(),
            Object::new().with("name", "ann"),
            ReactiveOptions::new().directives(directives),
        )
        .unwrap();

        assert_eq!(el.text_content(), "ANN");
        view.set("name", "bo").unwrap();
        assert_eq!(el.text_content(), "BO");
        assert_eq!(renders.get(), 2);
    }

    #[test]
    fn change_with_markers_watches_every_path() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let directives = Directives::new().with("data-label", move |binding, _, _, _| {
            let seen = seen_clone.clone();
            binding.change(move |b| {
                seen.borrow_mut().push(b.interpolate(b.attribute())?);
                Ok(())
            })
        });

        let el = root(r#"<p data-label="{first} {last}"></p>"#);
        let view = View::new(
            el,
            Object::new().with("first", "Ann").with("last", "Lee"),
            ReactiveOptions::new().directives(directives),
        )
        .unwrap();
        view.set("last", "Bo").unwrap();

        assert_eq!(*seen.borrow(), vec!["Ann Lee", "Ann Bo"]);
    }

    #[test]
    fn skip_stops_descent() {
        let directives = Directives::new().with("data-stop", |binding, _, _, _| {
            binding.skip = true;
            Ok(())
        });
        let el = root(r#"<div data-stop="x"><span>{name}</span></div>"#);
        let _view = View::new(
            el.clone(),
            Object::new().with("name", "Ann"),
            ReactiveOptions::new().directives(directives),
        )
        .unwrap();

        assert_eq!(el.text_content(), "{name}");
    }
}
