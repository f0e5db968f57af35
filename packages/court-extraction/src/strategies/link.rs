//! Document-link strategy: anchors whose href points at an opinion file.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use super::text::{clean_caption, element_text};
use super::{PageContext, Strategy, StrategyKind};
use crate::types::candidate::Candidate;

/// Ancestors searched for a caption.
const CAPTION_DEPTH: usize = 3;

/// Ancestors searched for a filing date.
const DATE_DEPTH: usize = 6;

lazy_static! {
    static ref LINK: Selector = Selector::parse("a[href]").expect("valid selector");
}

/// Reads anchors matching the court's document-link pattern and infers
/// the case metadata from the link and its surrounding markup.
pub struct DocumentLinkStrategy;

impl Strategy for DocumentLinkStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DocumentLink
    }

    fn candidates<'a>(
        &'a self,
        document: &'a Html,
        ctx: &'a PageContext,
    ) -> Box<dyn Iterator<Item = Candidate> + 'a> {
        Box::new(
            document
                .select(&LINK)
                .filter_map(move |link| parse_document_link(link, ctx)),
        )
    }
}

fn parse_document_link(link: ElementRef<'_>, ctx: &PageContext) -> Option<Candidate> {
    let href = link.value().attr("href")?;
    if !ctx.is_document_href(href) {
        return None;
    }

    let text = element_text(link);
    let case_number = ctx
        .find_case_number(href)
        .or_else(|| ctx.find_case_number(&text))?;

    Some(Candidate {
        case_name: caption_near(link, &text, &case_number),
        date_filed: ctx.date_near(link, DATE_DEPTH),
        document_url: ctx.resolve(href),
        case_number,
        ..Default::default()
    })
}

/// Caption from the link text, else from the closest ancestor that says
/// more than the case number.
pub(crate) fn caption_near(link: ElementRef<'_>, link_text: &str, case_number: &str) -> String {
    let caption = clean_caption(link_text, case_number);
    if !caption.is_empty() {
        return caption;
    }

    link.ancestors()
        .filter_map(ElementRef::wrap)
        .take(CAPTION_DEPTH)
        .map(|ancestor| clean_caption(&element_text(ancestor), case_number))
        .find(|c| !c.is_empty())
        .unwrap_or_default()
}
