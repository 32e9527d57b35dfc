//! Built-in directives.

use std::rc::Rc;

use tracing::debug;

use super::directive::{Binding, Directive, Directives};
use super::each::each;
use crate::dom::{carry, classes, Event, Node};
use crate::error::{ReactiveError, Result};
use crate::model::Value;

/// Attributes with a `data-<attr>` directive.
pub const ATTRIBUTES: &[&str] = &[
    "id",
    "src",
    "rel",
    "cols",
    "rows",
    "name",
    "href",
    "title",
    "class",
    "style",
    "width",
    "value",
    "height",
    "tabindex",
    "placeholder",
];

/// Events with an `on-<event>` directive.
pub const EVENTS: &[&str] = &[
    "change",
    "click",
    "dblclick",
    "mousedown",
    "mouseup",
    "mouseenter",
    "mouseleave",
    "scroll",
    "blur",
    "focus",
    "input",
    "submit",
    "keydown",
    "keypress",
    "keyup",
];

pub(crate) fn install(directives: &mut Directives) {
    directives.insert("each", Rc::new(each));
    for &attr in ATTRIBUTES {
        directives.insert(&format!("data-{attr}"), attribute(attr));
    }
    directives.insert("data-visible", Rc::new(visible));
    directives.insert("data-hidden", Rc::new(hidden));
    directives.insert("data-checked", Rc::new(checked));
    directives.insert("data-text", Rc::new(text));
    directives.insert("data-html", Rc::new(html));
    for &event in EVENTS {
        directives.insert(&format!("on-{event}"), listener(event));
    }
    directives.insert("data-append", Rc::new(append));
    directives.insert("data-replace", Rc::new(replace));
}

/// `data-<attr>`: keep `<attr>` equal to the interpolated value.
fn attribute(attr: &'static str) -> Directive {
    Rc::new(move |binding: &mut Binding, _: &Node, _: &str, _: &Value| {
        binding.change(move |b| {
            let value = b.interpolate(b.attribute())?;
            b.element().set_attribute(attr, value);
            Ok(())
        })
    })
}

fn toggle(el: &Node, show: bool) {
    if show {
        classes(el).add("visible").remove("hidden");
    } else {
        classes(el).remove("visible").add("hidden");
    }
}

fn visible(binding: &mut Binding, _: &Node, _: &str, _: &Value) -> Result<()> {
    binding.change(|b| {
        toggle(b.element(), b.value(b.attribute()).is_truthy());
        Ok(())
    })
}

fn hidden(binding: &mut Binding, _: &Node, _: &str, _: &Value) -> Result<()> {
    binding.change(|b| {
        toggle(b.element(), !b.value(b.attribute()).is_truthy());
        Ok(())
    })
}

fn checked(binding: &mut Binding, _: &Node, _: &str, _: &Value) -> Result<()> {
    binding.change(|b| {
        if b.value(b.attribute()).is_truthy() {
            b.element().set_attribute("checked", "checked");
        } else {
            b.element().remove_attribute("checked");
        }
        Ok(())
    })
}

fn text(binding: &mut Binding, _: &Node, _: &str, _: &Value) -> Result<()> {
    binding.change(|b| {
        let text = b.interpolate(b.attribute())?;
        b.element().set_text_content(&text);
        Ok(())
    })
}

fn html(binding: &mut Binding, _: &Node, _: &str, _: &Value) -> Result<()> {
    binding.change(|b| {
        let markup = b.interpolate(b.attribute())?;
        b.element().set_inner_html(&markup)
    })
}

/// `on-<event>`: call the delegate handler named by the attribute.
///
/// The handler is looked up when the event fires, so a missing one is only
/// an error then.
fn listener(event: &'static str) -> Directive {
    Rc::new(move |binding: &mut Binding, el: &Node, method: &str, _: &Value| {
        let view = binding.weak_view();
        let method = method.to_string();
        el.add_event_listener(
            event,
            Rc::new(move |e: &Event| {
                e.prevent_default();
                let Some(view) = view.upgrade() else {
                    return Ok(());
                };
                let handler = view
                    .delegate()
                    .and_then(|delegate| delegate.handler(&method))
                    .ok_or_else(|| ReactiveError::MissingMethod {
                        method: method.clone(),
                    })?;
                debug!(target: "rebind", event, method = %method, "dispatch");
                handler(e, &view)
            }),
        );
        Ok(())
    })
}

fn node_at(binding: &Binding, path: &str) -> Result<Node> {
    match binding.value(path) {
        Value::Node(node) => Ok(node),
        _ => Err(ReactiveError::NotANode {
            path: path.to_string(),
        }),
    }
}

fn append(binding: &mut Binding, el: &Node, path: &str, _: &Value) -> Result<()> {
    let node = node_at(binding, path)?;
    el.append_child(&node);
    Ok(())
}

fn replace(binding: &mut Binding, el: &Node, path: &str, _: &Value) -> Result<()> {
    let node = node_at(binding, path)?;
    let parent = el.parent().ok_or(ReactiveError::Detached)?;
    let node = carry(&node, el);
    parent.replace_child(&node, el);
    Ok(())
}
