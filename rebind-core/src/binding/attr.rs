//! Attribute interpolation.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::dom::Node;
use crate::error::Result;
use crate::expr::Template;
use crate::reactive::{Handler, View, WeakView};

/// Keeps one attribute's value in sync with its `{expr}` template.
pub struct AttrBinding {
    view: WeakView,
    node: Node,
    name: String,
    template: Template,
    renders: Cell<usize>,
}

impl AttrBinding {
    /// Compile the current value of attribute `name`, subscribe to its paths
    /// and render once.
    pub fn new(view: &View, node: &Node, name: &str) -> Result<Rc<Self>> {
        let text = node.attribute(name).unwrap_or_default();
        let template = Template::compile(&text)?;
        debug!(target: "rebind", attribute = name, paths = ?template.paths(), "bind attribute");

        let binding = Rc::new(Self {
            view: view.downgrade(),
            node: node.clone(),
            name: name.to_string(),
            template,
            renders: Cell::new(0),
        });
        for path in binding.template.paths() {
            let this = Rc::clone(&binding);
            view.sub(path, Handler::new(move |_| this.render()));
        }
        binding.render()?;
        Ok(binding)
    }

    pub fn render(&self) -> Result<()> {
        let Some(view) = self.view.upgrade() else {
            return Ok(());
        };
        let value = self.template.render(&view)?;
        trace!(target: "rebind", attribute = %self.name, value = %value, "render");
        self.node.set_attribute(&self.name, value);
        self.renders.set(self.renders.get() + 1);
        Ok(())
    }

    pub fn render_count(&self) -> usize {
        self.renders.get()
    }

    pub fn template(&self) -> &Template {
        &self.template
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Object;
    use crate::reactive::ReactiveOptions;

    fn view_over(el: &Node, model: Object) -> View {
        View::new(el.clone(), model, ReactiveOptions::new()).unwrap()
    }

    #[test]
    fn renders_and_follows_sets() {
        let el = Node::element("a");
        el.set_attribute("title", "{first} {last}");
        let view = view_over(&el, Object::new().with("first", "Ann"));

        assert_eq!(el.attribute("title").as_deref(), Some("Ann "));
        view.set("last", "Lee").unwrap();
        assert_eq!(el.attribute("title").as_deref(), Some("Ann Lee"));
    }

    #[test]
    fn render_is_idempotent() {
        let el = Node::element("a");
        el.set_attribute("href", "/x/{id}");
        let view = view_over(&el, Object::new().with("id", 1));

        el.set_attribute("href", "/x/{id}");
        let binding = AttrBinding::new(&view, &el, "href").unwrap();
        binding.render().unwrap();
        let first = el.attribute("href");
        binding.render().unwrap();

        assert_eq!(el.attribute("href"), first);
        assert_eq!(binding.render_count(), 3);
    }

    #[test]
    fn renders_once_per_set() {
        let el = Node::element("a");
        el.set_attribute("title", "{name}");
        let view = view_over(&el, Object::observable().with("name", "Ann"));

        el.set_attribute("title", "{name}");
        let binding = AttrBinding::new(&view, &el, "title").unwrap();
        assert_eq!(binding.render_count(), 1);

        view.set("name", "Bo").unwrap();
        assert_eq!(binding.render_count(), 2);
    }
}
