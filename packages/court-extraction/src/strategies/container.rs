//! Container strategy: generic result blocks identified by class name.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use super::text::{clean_caption, element_text};
use super::{PageContext, Strategy, StrategyKind};
use crate::types::candidate::Candidate;
use crate::types::date::find_date;

lazy_static! {
    static ref CONTAINER: Selector =
        Selector::parse("div[class], article[class], section[class], li[class]")
            .expect("valid selector");
    static ref LINK: Selector = Selector::parse("a[href]").expect("valid selector");
}

/// Reads `div`/`article`/`section`/`li` blocks whose class matches the
/// court's container pattern. Only the innermost matching blocks are read,
/// so a wrapper like `search-results` does not swallow its items.
pub struct ContainerStrategy;

impl Strategy for ContainerStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Container
    }

    fn candidates<'a>(
        &'a self,
        document: &'a Html,
        ctx: &'a PageContext,
    ) -> Box<dyn Iterator<Item = Candidate> + 'a> {
        Box::new(
            document
                .select(&CONTAINER)
                .filter(move |el| is_container(*el, ctx) && !has_nested_container(*el, ctx))
                .filter_map(move |el| parse_container(el, ctx)),
        )
    }
}

fn is_container(element: ElementRef<'_>, ctx: &PageContext) -> bool {
    element
        .value()
        .attr("class")
        .map(|class| ctx.is_container_class(class))
        .unwrap_or(false)
}

fn has_nested_container(element: ElementRef<'_>, ctx: &PageContext) -> bool {
    element
        .select(&CONTAINER)
        .any(|inner| inner.id() != element.id() && is_container(inner, ctx))
}

fn parse_container(container: ElementRef<'_>, ctx: &PageContext) -> Option<Candidate> {
    let text = element_text(container);
    let case_number = ctx.find_case_number(&text)?;

    let document_url = container
        .select(&LINK)
        .filter_map(|link| link.value().attr("href"))
        .find(|href| ctx.is_document_href(href))
        .and_then(|href| ctx.resolve(href));

    let case_name = container
        .text()
        .map(|piece| clean_caption(piece, &case_number))
        .find(|piece| piece.chars().count() >= 4)
        .unwrap_or_else(|| clean_caption(&text, &case_number));

    Some(Candidate {
        case_name,
        date_filed: find_date(&text),
        document_url,
        case_number,
        ..Default::default()
    })
}
