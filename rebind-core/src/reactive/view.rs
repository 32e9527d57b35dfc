//! View controller.
//!
//! A [`View`] ties one DOM subtree to one model. Construction walks the tree
//! once and installs every binding; afterwards the DOM follows the model
//! through two channels:
//!
//! - the view's own bus, for writes made through [`View::set`]
//! - the adapter's subscriptions, for writes made to the model directly
//!
//! # How It Works
//!
//! Every binding subscribes its re-render through [`View::sub`], which puts
//! the handler on both channels. A `set` writes through the adapter and then
//! emits on the bus. An observable model echoes that write back through the
//! adapter channel; the [`InternalSet`] guard drops the echo so each binding
//! renders exactly once per `set`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::context::InternalSet;
use super::emitter::Emitter;
use super::options::ReactiveOptions;
use super::subscriber::Handler;
use super::walk::{walk, Walk};
use crate::binding::{AttrBinding, Binding, Directive, Directives, TextBinding};
use crate::dom::{parse_html, Node, NodeKind};
use crate::error::{ReactiveError, Result};
use crate::expr::{has_interpolation, Scope};
use crate::model::{default_adapter, resolve, Adapter, AdapterFactory, Object, Value};

struct ViewInner {
    el: Node,
    model: Value,
    adapter: Box<dyn Adapter>,
    adapter_factory: AdapterFactory,
    delegate: Option<Object>,
    directives: RefCell<Directives>,
    bus: Emitter,
    internal_set: InternalSet,
    destroyed: Cell<bool>,
}

/// A bound DOM subtree. Cloning yields another handle to the same view.
///
/// Bindings only hold weak handles. Once the last `View` handle is dropped
/// the bindings go quiet: model changes no longer reach the DOM and `on-*`
/// handlers do nothing. Keep a handle for as long as the DOM should follow
/// the model, and call [`View::destroy`] to detach it.
#[derive(Clone)]
#[must_use = "bindings stop updating once every handle to the view is dropped"]
pub struct View(Rc<ViewInner>);

/// Non-owning handle to a [`View`]. Bindings hold these.
#[derive(Clone, Default)]
pub struct WeakView(Weak<ViewInner>);

impl WeakView {
    pub fn upgrade(&self) -> Option<View> {
        self.0.upgrade().map(View)
    }
}

impl View {
    /// Bind `el` to `model`.
    ///
    /// The whole subtree is walked and rendered before this returns. The
    /// returned handle keeps the bindings alive.
    pub fn new(el: Node, model: impl Into<Value>, options: ReactiveOptions) -> Result<Self> {
        let model = model.into();
        let adapter_factory = options.adapter.unwrap_or_else(default_adapter);
        let adapter = adapter_factory(model.clone());

        let view = View(Rc::new(ViewInner {
            el,
            model,
            adapter,
            adapter_factory,
            delegate: options.delegate,
            directives: RefCell::new(options.directives.unwrap_or_else(Directives::builtin)),
            bus: Emitter::new(),
            internal_set: InternalSet::new(),
            destroyed: Cell::new(false),
        }));

        debug!(target: "rebind", root = ?view.0.el, "new view");
        if let Err(e) = view.bind_tree() {
            view.0.adapter.unsubscribe_all();
            return Err(e);
        }
        Ok(view)
    }

    /// Parse `markup` and bind the result.
    ///
    /// A single top-level element (surrounding whitespace aside) becomes the
    /// root. Anything else is wrapped in a fragment.
    pub fn from_html(markup: &str, model: impl Into<Value>, options: ReactiveOptions) -> Result<Self> {
        let nodes = parse_html(markup)?;
        let significant: Vec<&Node> = nodes
            .iter()
            .filter(|n| !(n.is_text() && n.data().trim().is_empty()))
            .collect();

        let root = match significant.as_slice() {
            [] => return Err(ReactiveError::Parse("markup contains no nodes".into())),
            [only] if only.is_element() => (*only).clone(),
            _ => {
                let fragment = Node::fragment();
                for node in &nodes {
                    fragment.append_child(node);
                }
                fragment
            }
        };
        Self::new(root, model, options)
    }

    fn bind_tree(&self) -> Result<()> {
        let directives = self.directives();
        let root = self.0.el.clone();
        walk(&root, &mut |node: &Node| self.bind_node(node, &directives))
    }

    fn bind_node(&self, node: &Node, directives: &Directives) -> Result<Walk> {
        match node.kind() {
            NodeKind::Element(_) => {
                let attrs: IndexMap<String, String> = node.attributes().into_iter().collect();
                for (name, directive) in directives.iter() {
                    let Some(value) = attrs.get(name) else {
                        continue;
                    };
                    debug!(target: "rebind", directive = name.as_str(), "bind");
                    let mut binding = Binding::new(name, self, node, value);
                    binding.bind(directive)?;
                    if binding.skip {
                        return Ok(Walk::Skip);
                    }
                }

                for (name, value) in node.attributes() {
                    if has_interpolation(&value) {
                        AttrBinding::new(self, node, &name)?;
                    }
                }
                Ok(Walk::Continue)
            }
            NodeKind::Text => {
                if has_interpolation(&node.data()) {
                    TextBinding::new(self, node)?;
                }
                Ok(Walk::Continue)
            }
            NodeKind::Fragment => Ok(Walk::Continue),
        }
    }

    // ------------------------------------------------------------------
    // Model access
    // ------------------------------------------------------------------

    /// Read `path`.
    ///
    /// `this` is the model itself. A falsy model value defers to the
    /// delegate; when the delegate has nothing truthy either, the model
    /// value is returned as is.
    pub fn get(&self, path: &str) -> Value {
        if path == "this" {
            return self.0.model.clone();
        }
        let value = self.0.adapter.get(path);
        if value.is_truthy() {
            return value;
        }
        if let Some(delegate) = &self.0.delegate {
            let fallback = resolve(&Value::Object(delegate.clone()), path);
            if fallback.is_truthy() {
                return fallback;
            }
        }
        value
    }

    /// Write `path` and re-render every binding that depends on it.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let _scope = self.0.internal_set.enter();
        trace!(target: "rebind", path, "set");
        self.0.adapter.set(path, value.clone())?;
        self.0.bus.emit(&format!("change {path}"), &value)
    }

    /// Apply several writes in order.
    pub fn set_many<I, K, V>(&self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let _scope = self.0.internal_set.enter();
        for (path, value) in pairs {
            self.set(path.as_ref(), value)?;
        }
        Ok(())
    }

    /// Call the function at `path` on the model, or on the delegate.
    pub fn call(&self, path: &str, args: &[Value]) -> Result<Value> {
        if let Some(value) = self.0.adapter.call(path, args) {
            return Ok(value);
        }
        if let Some(function) = self.0.delegate.as_ref().and_then(|d| d.function(path)) {
            return Ok(function.call(args));
        }
        Err(ReactiveError::NotCallable {
            path: path.to_string(),
        })
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Run `handler` whenever `path` changes.
    ///
    /// A dotted path also subscribes its leading segment, so replacing
    /// `user` re-renders bindings on `user.name`.
    pub fn sub(&self, path: &str, handler: Handler) {
        if let Some((head, _)) = path.split_once('.') {
            self.sub(head, handler.clone());
        }

        debug!(target: "rebind", path, "subscribe");
        self.0.bus.on(&format!("change {path}"), handler.clone());

        let view = self.downgrade();
        let guarded = Handler::with_id(handler.id(), move |value| match view.upgrade() {
            Some(view) if !view.0.internal_set.is_active() => handler.call(value),
            _ => Ok(()),
        });
        self.0.adapter.subscribe(path, guarded);
    }

    /// Undo a matching [`View::sub`].
    pub fn unsub(&self, path: &str, handler: &Handler) {
        if let Some((head, _)) = path.split_once('.') {
            self.unsub(head, handler);
        }
        self.0.bus.off(&format!("change {path}"), handler);
        self.0.adapter.unsubscribe(path, handler);
    }

    /// Emit `"change <path>"` on the bus only. The model is not touched.
    pub fn notify(&self, path: &str, value: &Value) -> Result<()> {
        self.0.bus.emit(&format!("change {path}"), value)
    }

    pub fn on(&self, event: &str, handler: Handler) {
        self.0.bus.on(event, handler);
    }

    pub fn off(&self, event: &str, handler: &Handler) -> bool {
        self.0.bus.off(event, handler)
    }

    pub fn emit(&self, event: &str, value: &Value) -> Result<()> {
        self.0.bus.emit(event, value)
    }

    // ------------------------------------------------------------------
    // Directives
    // ------------------------------------------------------------------

    /// Bind `directive` to every element under the root (root included)
    /// carrying attribute `name`.
    pub fn bind(&self, name: &str, directive: Directive) -> Result<()> {
        let root = &self.0.el;
        let mut targets = Vec::new();
        if root.has_attribute(name) {
            targets.push(root.clone());
        }
        targets.extend(root.query_all_with_attribute(name));

        for target in targets {
            let value = target.attribute(name).unwrap_or_default();
            Binding::new(name, self, &target, &value).bind(&directive)?;
        }
        Ok(())
    }

    pub fn bind_all<I, K>(&self, directives: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Directive)>,
        K: AsRef<str>,
    {
        for (name, directive) in directives {
            self.bind(name.as_ref(), directive)?;
        }
        Ok(())
    }

    /// Add a directive for later `bind` calls and nested views.
    pub fn register_directive(&self, name: &str, directive: Directive) {
        self.0.directives.borrow_mut().insert(name, directive);
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Run `f` against this view, for plugins that add bindings or hooks.
    pub fn use_middleware<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&View),
    {
        f(self);
        self
    }

    /// Detach the root and drop every subscription. Idempotent.
    ///
    /// Handlers on `"destroyed"` run before the bus is cleared.
    pub fn destroy(&self) -> Result<()> {
        if self.0.destroyed.replace(true) {
            return Ok(());
        }
        debug!(target: "rebind", root = ?self.0.el, "destroy");
        self.0.el.detach();
        self.0.adapter.unsubscribe_all();
        let result = self.0.bus.emit("destroyed", &Value::Undefined);
        self.0.bus.clear();
        result
    }

    pub fn is_destroyed(&self) -> bool {
        self.0.destroyed.get()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn el(&self) -> &Node {
        &self.0.el
    }

    pub fn model(&self) -> &Value {
        &self.0.model
    }

    pub fn adapter(&self) -> &dyn Adapter {
        self.0.adapter.as_ref()
    }

    pub fn adapter_factory(&self) -> AdapterFactory {
        self.0.adapter_factory.clone()
    }

    pub fn delegate(&self) -> Option<&Object> {
        self.0.delegate.as_ref()
    }

    /// A copy of the directive registry.
    pub fn directives(&self) -> Directives {
        self.0.directives.borrow().clone()
    }

    pub fn downgrade(&self) -> WeakView {
        WeakView(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &View) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of handlers on the bus, across all events.
    pub fn listener_count(&self) -> usize {
        self.0.bus.listener_count()
    }
}

impl Scope for View {
    fn get(&self, path: &str) -> Value {
        View::get(self, path)
    }

    fn call(&self, path: &str, args: &[Value]) -> Result<Value> {
        View::call(self, path, args)
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("el", &self.0.el)
            .field("destroyed", &self.0.destroyed.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, Handler) {
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        let handler = Handler::new(move |_| {
            count_clone.set(count_clone.get() + 1);
            Ok(())
        });
        (count, handler)
    }

    fn plain_view(model: serde_json::Value) -> View {
        View::new(Node::element("div"), Value::from(model), ReactiveOptions::new()).unwrap()
    }

    // -----------------------------------------------------------------
    // get / set
    // -----------------------------------------------------------------

    #[test]
    fn get_reads_model_then_delegate() {
        let delegate = Object::new().with("title", "from delegate").with("name", "shadowed");
        let view = View::new(
            Node::element("div"),
            Value::from(json!({ "name": "Ann", "empty": "" })),
            ReactiveOptions::new().delegate(delegate),
        )
        .unwrap();

        assert_eq!(view.get("name"), Value::from("Ann"));
        assert_eq!(view.get("title"), Value::from("from delegate"));
        assert_eq!(view.get("empty"), Value::from(""));
        assert_eq!(view.get("nothing"), Value::Undefined);
        assert!(view.get("this").as_object().is_some());
    }

    #[test]
    fn set_then_get_round_trips() {
        let view = plain_view(json!({ "count": 1 }));
        view.set("count", 0).unwrap();
        assert_eq!(view.get("count"), Value::from(0));

        view.set_many([("a", "x"), ("b", "y")]).unwrap();
        assert_eq!(view.get("a"), Value::from("x"));
        assert_eq!(view.get("b"), Value::from("y"));
    }

    #[test]
    fn set_on_non_object_fails_and_releases_guard() {
        let view = View::new(Node::element("div"), Value::from("text"), ReactiveOptions::new())
            .unwrap();
        assert!(view.set("x", 1).is_err());
        assert!(!view.0.internal_set.is_active());
    }

    // -----------------------------------------------------------------
    // sub / unsub
    // -----------------------------------------------------------------

    #[test]
    fn sub_fires_on_set() {
        let view = plain_view(json!({}));
        let (count, handler) = counter();

        view.sub("name", handler);
        view.set("name", "Bo").unwrap();
        view.set("other", "x").unwrap();

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn dotted_sub_also_listens_to_head() {
        let view = plain_view(json!({ "user": { "name": "Ann" } }));
        let (count, handler) = counter();

        view.sub("user.name", handler.clone());
        view.set("user", Object::new()).unwrap();
        view.set("user.name", "Bo").unwrap();
        assert_eq!(count.get(), 2);

        view.unsub("user.name", &handler);
        view.set("user", Object::new()).unwrap();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn observable_echo_is_suppressed() {
        let model = Object::observable().with("name", "Ann");
        let view = View::new(Node::element("div"), model.clone(), ReactiveOptions::new()).unwrap();
        let (count, handler) = counter();
        view.sub("name", handler);

        view.set("name", "Bo").unwrap();
        assert_eq!(count.get(), 1);

        // Direct writes to the model reach the view through the adapter.
        model.set("name", Value::from("Cy")).unwrap();
        assert_eq!(count.get(), 2);
    }

    // -----------------------------------------------------------------
    // call
    // -----------------------------------------------------------------

    #[test]
    fn call_prefers_model_then_delegate() {
        let model = Object::new().with_accessor("who", |_| Value::from("model"));
        let delegate = Object::new()
            .with_accessor("who", |_| Value::from("delegate"))
            .with_accessor("only", |_| Value::from("delegate only"));
        let view = View::new(
            Node::element("div"),
            model,
            ReactiveOptions::new().delegate(delegate),
        )
        .unwrap();

        assert_eq!(view.call("who", &[]).unwrap(), Value::from("model"));
        assert_eq!(view.call("only", &[]).unwrap(), Value::from("delegate only"));
        assert!(matches!(
            view.call("none", &[]),
            Err(ReactiveError::NotCallable { .. })
        ));
    }

    // -----------------------------------------------------------------
    // lifecycle
    // -----------------------------------------------------------------

    #[test]
    fn destroy_detaches_and_is_idempotent() {
        let parent = Node::element("body");
        let el = Node::element("div");
        parent.append_child(&el);

        let view = View::new(el.clone(), Object::new(), ReactiveOptions::new()).unwrap();
        let (count, handler) = counter();
        view.on("destroyed", handler);

        view.destroy().unwrap();
        view.destroy().unwrap();

        assert!(el.parent().is_none());
        assert!(view.is_destroyed());
        assert_eq!(count.get(), 1);
        assert_eq!(view.listener_count(), 0);
    }

    #[test]
    fn bindings_follow_model_while_a_handle_lives() {
        let model = Object::observable().with("name", "Ann");
        let el = Node::element("p");
        el.append_child(&Node::text("{name}"));

        let view = View::new(el.clone(), model.clone(), ReactiveOptions::new()).unwrap();
        let other = view.clone();
        drop(view);
        model.set("name", Value::from("Bo")).unwrap();
        assert_eq!(el.text_content(), "Bo");

        drop(other);
        model.set("name", Value::from("Cy")).unwrap();
        assert_eq!(el.text_content(), "Bo");
    }

    #[test]
    fn from_html_picks_single_root() {
        let view = View::from_html("\n  <p>{a}</p>\n", Object::new(), ReactiveOptions::new()).unwrap();
        assert_eq!(view.el().tag_name(), Some("p"));

        let view = View::from_html("<p></p><p></p>", Object::new(), ReactiveOptions::new()).unwrap();
        assert!(view.el().is_fragment());
        assert_eq!(view.el().child_count(), 2);

        assert!(View::from_html("   ", Object::new(), ReactiveOptions::new()).is_err());
    }

    #[test]
    fn middleware_runs_against_view() {
        let view = plain_view(json!({}));
        let ran = Cell::new(false);
        view.use_middleware(|v| {
            ran.set(v.get("this").as_object().is_some());
        });
        assert!(ran.get());
    }

    #[test]
    fn bind_covers_root_and_descendants() {
        let root = crate::dom::parse_fragment(r#"<div data-x="a"><span data-x="b"></span></div>"#)
            .unwrap()
            .first_child()
            .unwrap();
        let view = View::new(root, Object::new(), ReactiveOptions::new()).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let directive: Directive = Rc::new(move |_: &mut Binding, _: &Node, value: &str, _: &Value| {
            seen_clone.borrow_mut().push(value.to_string());
            Ok(())
        });
        view.bind("data-x", directive).unwrap();

        assert_eq!(*seen.borrow(), vec!["a", "b"]);
    }
}
