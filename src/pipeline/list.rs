//! Bounded list rendering with "show more" continuations.

use super::{Backend, Renderer};
use crate::config::RawConfig;
use futures_util::future::{join_all, FutureExt, LocalBoxFuture};
use serde_json::{Map, Value};
use std::rc::Rc;

/// Slice selection for [`Renderer::render_list`].
#[derive(Debug, Clone)]
pub struct ListOptions<B: Backend> {
    /// First item to render.
    pub offset: usize,
    /// Number of items to render; `None` renders everything after `offset`.
    pub limit: Option<usize>,
    /// Where "more" affordances go; defaults to the list container.
    pub more_container: Option<B::Node>,
}

impl<B: Backend> Default for ListOptions<B> {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: None,
            more_container: None,
        }
    }
}

impl<B: Backend> ListOptions<B> {
    #[must_use]
    pub fn limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}

/// Everything needed to render the rest of a list later.
#[derive(Debug, Clone)]
pub struct ListContinuation<B: Backend> {
    pub item_config: RawConfig<B>,
    pub data: Rc<Vec<Value>>,
    pub context: Value,
    /// Offset of the first item not rendered yet.
    pub offset: usize,
    /// Page size of the list.
    pub limit: Option<usize>,
    /// Items left after `offset`.
    pub remaining: usize,
    pub more_container: Option<B::Node>,
}

impl<B: Backend> ListContinuation<B> {
    /// Items the next page would render.
    #[must_use]
    pub fn next_page(&self) -> usize {
        self.limit.map_or(self.remaining, |limit| limit.min(self.remaining))
    }

    /// Renders the next page, or everything left when `all` is set.
    pub fn render_next(&self, renderer: &Renderer<B>, container: &B::Node, all: bool) -> LocalBoxFuture<'static, B::Node> {
        let options = ListOptions {
            offset: self.offset,
            limit: if all { None } else { self.limit },
            more_container: self.more_container.clone(),
        };
        renderer.render_list(
            container,
            self.item_config.clone(),
            Rc::clone(&self.data),
            self.context.clone(),
            options,
        )
    }
}

/// Interprets a `limit` prop.
///
/// `false` means unlimited, a positive number is the limit, anything else
/// falls back to `default`.
///
/// # Examples
///
/// ```
/// use dashview::pipeline::list_limit;
/// use serde_json::json;
///
/// assert_eq!(list_limit(Some(&json!(false)), Some(25)), None);
/// assert_eq!(list_limit(Some(&json!(10)), Some(25)), Some(10));
/// assert_eq!(list_limit(Some(&json!("x")), Some(25)), Some(25));
/// assert_eq!(list_limit(None, Some(25)), Some(25));
/// ```
#[must_use]
pub fn list_limit(value: Option<&Value>, default: Option<usize>) -> Option<usize> {
    match value {
        Some(Value::Bool(false)) => None,
        Some(Value::Number(number)) => match number.as_f64() {
            Some(n) if n.is_infinite() => None,
            Some(n) if n >= 1.0 => Some(n as usize),
            _ => default,
        },
        Some(Value::String(text)) => match text.trim().parse::<usize>() {
            Ok(n) if n > 0 => Some(n),
            _ => default,
        },
        _ => default,
    }
}

/// Position of one rendered item; every item of a slice shares the data.
#[derive(Debug, Clone)]
pub struct ListItem {
    items: Rc<Vec<Value>>,
    start: usize,
    end: usize,
    index: usize,
}

impl ListItem {
    /// Index into the whole array.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Index into the rendered slice.
    #[must_use]
    pub const fn slice_index(&self) -> usize {
        self.index - self.start
    }

    /// The whole array the list was rendered from.
    #[must_use]
    pub fn array(&self) -> &[Value] {
        &self.items
    }

    /// The items rendered by this page.
    #[must_use]
    pub fn slice(&self) -> &[Value] {
        &self.items[self.start..self.end]
    }
}

/// `context` plus the item's `index` and `sliceIndex`.
fn item_context(context: &Value, item: &ListItem) -> Value {
    let mut fields = match context {
        Value::Object(fields) => fields.clone(),
        _ => Map::new(),
    };
    fields.insert("index".into(), Value::from(item.index()));
    fields.insert("sliceIndex".into(), Value::from(item.slice_index()));
    Value::Object(fields)
}

impl<B: Backend> Renderer<B> {
    /// Renders `data[offset..offset + limit]` with `item_config`, then "more" affordances.
    ///
    /// Each item is rendered with the item as data and the context extended
    /// with `index` and `sliceIndex`. Views reach the whole array and the
    /// slice through [`RenderCall::item`](crate::view::RenderCall::item).
    pub fn render_list(
        &self,
        container: &B::Node,
        item_config: impl Into<RawConfig<B>>,
        data: impl Into<Rc<Vec<Value>>>,
        context: Value,
        options: ListOptions<B>,
    ) -> LocalBoxFuture<'static, B::Node> {
        let item_config = item_config.into();
        let data: Rc<Vec<Value>> = data.into();
        let start = options.offset.min(data.len());
        let end = options
            .limit
            .map_or(data.len(), |limit| start.saturating_add(limit).min(data.len()));

        let tasks: Vec<_> = (start..end)
            .map(|index| {
                let item = ListItem {
                    items: Rc::clone(&data),
                    start,
                    end,
                    index,
                };
                let context = item_context(&context, &item);
                self.render_item(container, item_config.clone(), data[index].clone(), context, Some(item))
            })
            .collect();

        let remaining = data.len() - end;
        if remaining > 0 {
            let continuation = ListContinuation {
                item_config,
                data: Rc::clone(&data),
                context,
                offset: end,
                limit: options.limit,
                remaining,
                more_container: options.more_container,
            };
            B::render_more(self, container, continuation);
        }

        tracing::debug!(rendered = end - start, remaining, "list slice rendered");
        let container = container.clone();
        join_all(tasks).map(move |_| container).boxed_local()
    }
}
