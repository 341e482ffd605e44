//! Walkthrough - a prepass over a small page.
//!
//! Run with `RUST_LOG=prepass=debug` to see frames being parked and resumed.

use prepass::core::{ClassType, LazyStatus};
use prepass::prelude::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Fake data source filled in by the prepass.
#[derive(Default)]
struct Cache {
    users: RefCell<HashMap<u32, String>>,
}

impl Cache {
    /// The user's name, or a suspension that loads it.
    fn user(self: &Rc<Self>, id: u32) -> Result<String, Interrupt> {
        if let Some(name) = self.users.borrow().get(&id) {
            return Ok(name.clone());
        }
        let cache = Rc::clone(self);
        Err(Interrupt::suspend(async move {
            tokio::time::sleep(Duration::from_millis(20 * u64::from(id))).await;
            tracing::info!(id, "loaded user");
            cache.users.borrow_mut().insert(id, format!("user-{}", id));
        }))
    }
}

fn profile(cache: &Rc<Cache>, theme: &Context<&'static str>) -> ComponentType {
    let cache = Rc::clone(cache);
    let theme = theme.clone();
    ComponentType::function("Profile", move |cx| {
        let id = cx.props().get::<u32>().copied().unwrap_or_default();
        let theme = cx.use_context(&theme)?;
        let name = cx.use_memo(|| format!("#{}", id), Some(id))?;
        let user = cache.user(id)?;
        tracing::info!(%user, theme, tag = %name, "rendered profile");
        Ok(Node::host("p", [Node::text(user)]))
    })
}

struct ErrorBoundary;

impl ClassComponent for ErrorBoundary {
    fn render(&mut self, cx: &mut RenderCx<'_>) -> RenderResult {
        Ok(match cx.fault() {
            Some(fault) => {
                tracing::info!(%fault, "boundary recovered");
                Node::text("something went wrong")
            }
            None => cx.children(),
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cache = Rc::new(Cache::default());
    let theme = create_context("light");
    let profile = profile(&cache, &theme);

    let footer = LazyComponent::new(|| async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(LazyExport::Module {
            default: Some(ComponentType::function("Footer", |_| Ok(Node::text("footer")))),
        })
    });

    let broken = ComponentType::function("Broken", |_| Err(Interrupt::Fault(Fault::msg("widget exploded"))));
    let boundary: ComponentType = ClassType::new("ErrorBoundary", |_: &Props| ErrorBoundary)
        .error_boundary()
        .into();

    let page = Node::host(
        "main",
        [
            theme.provider(
                "dark",
                [
                    profile.element(Props::new(2_u32)),
                    profile.element(Props::new(1_u32)),
                ],
            ),
            boundary.element(Props::none().with_children([broken.element(Props::none())])),
            footer.element(Props::none()),
        ],
    );

    let visitor = |node: &Node, instance: Option<&ClassInstance>| -> Option<Thenable> {
        match node.component_type() {
            Some(component) => tracing::debug!(component = component.name(), class = instance.is_some(), "visit"),
            None => tracing::debug!(kind = node.kind(), "visit"),
        }
        None
    };

    let config = PrepassConfig::default().with_resolve_lazy(true);
    match run_with(page, visitor, config).await {
        Ok(()) => tracing::info!(
            users = cache.users.borrow().len(),
            footer_loaded = footer.status() == LazyStatus::Resolved,
            "prepass finished"
        ),
        Err(error) => tracing::error!(%error, "prepass failed"),
    }
}
