//! Text interpolation.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::dom::Node;
use crate::error::Result;
use crate::expr::Template;
use crate::reactive::{Handler, View, WeakView};

/// Keeps a text node's data in sync with its `{expr}` template.
pub struct TextBinding {
    view: WeakView,
    node: Node,
    template: Template,
    renders: Cell<usize>,
}

impl TextBinding {
    pub fn new(view: &View, node: &Node) -> Result<Rc<Self>> {
        let template = Template::compile(&node.data())?;
        debug!(target: "rebind", paths = ?template.paths(), "bind text");

        let binding = Rc::new(Self {
            view: view.downgrade(),
            node: node.clone(),
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
        let data = self.template.render(&view)?;
        trace!(target: "rebind", data = %data, "render");
        self.node.set_data(data);
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
