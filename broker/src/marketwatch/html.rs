//! Thin extraction of the few fields the game pages expose.
//!
//! Not an HTML parser: scans for opening tags by name, reads quoted
//! attributes, and takes the text run after a tag. Good enough for the
//! `data-*` attributes and single-value spans the VSE pages carry.

use vsebook::{Position, Ticker, TradingSymbol};

use crate::error::BrokerError;

/// An opening tag: its raw text and the byte offset just past its `>`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tag<'a> {
    pub raw: &'a str,
    pub end: usize,
}

impl<'a> Tag<'a> {
    pub fn attr(&self, name: &str) -> Option<String> {
        attr(self.raw, name)
    }

    /// True when the tag's class list contains every class in `classes`.
    pub fn has_classes(&self, classes: &str) -> bool {
        let Some(list) = self.attr("class") else {
            return false;
        };
        classes
            .split_whitespace()
            .all(|wanted| list.split_whitespace().any(|c| c == wanted))
    }
}

/// All opening tags named `name`, in document order.
pub(crate) fn open_tags<'a>(html: &'a str, name: &str) -> Vec<Tag<'a>> {
    let needle = format!("<{name}");
    let mut tags = Vec::new();
    let mut pos = 0;
    while let Some(found) = html[pos..].find(&needle) {
        let start = pos + found;
        let after = start + needle.len();
        pos = after;
        match html[after..].chars().next() {
            Some(c) if c.is_ascii_whitespace() || c == '>' || c == '/' => {}
            _ => continue,
        }
        let Some(close) = html[after..].find('>') else {
            break;
        };
        let end = after + close + 1;
        tags.push(Tag {
            raw: &html[start..end],
            end,
        });
        pos = end;
    }
    tags
}

/// First `name` tag carrying all of `classes`.
pub(crate) fn find_tag<'a>(html: &'a str, name: &str, classes: &str) -> Option<Tag<'a>> {
    open_tags(html, name)
        .into_iter()
        .find(|t| t.has_classes(classes))
}

/// Trimmed text between the end of a tag and the next `<`.
pub(crate) fn text_after(html: &str, tag: &Tag<'_>) -> String {
    let rest = &html[tag.end..];
    let end = rest.find('<').unwrap_or(rest.len());
    decode_entities(rest[..end].trim())
}

/// Value of attribute `name` in a raw opening tag.
pub(crate) fn attr(tag: &str, name: &str) -> Option<String> {
    let mut search = 0;
    while let Some(found) = tag[search..].find(name) {
        let start = search + found;
        search = start + name.len();

        let preceded_by_space = tag[..start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_whitespace());
        let rest = tag[search..].trim_start();
        if !preceded_by_space || !rest.starts_with('=') {
            continue;
        }

        let value = rest[1..].trim_start();
        let quote = value.chars().next()?;
        if quote == '"' || quote == '\'' {
            let body = &value[1..];
            let close = body.find(quote)?;
            return Some(decode_entities(&body[..close]));
        }
        let end = value
            .find(|c: char| c.is_ascii_whitespace() || c == '>')
            .unwrap_or(value.len());
        return Some(decode_entities(&value[..end]));
    }
    None
}

fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Parse a money string like `$1,234,567.89`.
pub(crate) fn parse_money(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Account worth: the first `span.data` inside `ul.performance`.
pub fn parse_portfolio_value(html: &str) -> Result<f64, BrokerError> {
    let list = find_tag(html, "ul", "performance")
        .ok_or_else(|| BrokerError::Parse("performance summary not found".into()))?;
    let scope = &html[list.end..];
    let span = find_tag(scope, "span", "data")
        .ok_or_else(|| BrokerError::Parse("net worth field not found".into()))?;
    let text = text_after(scope, &span);
    parse_money(&text).ok_or_else(|| BrokerError::Parse(format!("unparseable net worth {text:?}")))
}

/// Holdings rows from the partial holdings page.
///
/// Each `<tr>` in the `table.highlight` body carries `data-ticker`,
/// `data-symbol`, `data-shares` and `data-type`; `Short` rows are negated.
/// A page without the table has no positions.
pub fn parse_holdings(html: &str) -> Result<Vec<Position>, BrokerError> {
    let Some(table) = find_tag(html, "table", "highlight") else {
        return Ok(Vec::new());
    };
    let body = &html[table.end..];
    let body = &body[..body.find("</table>").unwrap_or(body.len())];

    let mut positions = Vec::new();
    for row in open_tags(body, "tr") {
        let Some(raw_ticker) = row.attr("data-ticker") else {
            continue;
        };
        let ticker = Ticker::try_new(&raw_ticker)
            .map_err(|e| BrokerError::Parse(format!("holdings row: {e}")))?;
        let raw_shares = row
            .attr("data-shares")
            .ok_or_else(|| BrokerError::Parse(format!("no share count for {ticker}")))?;
        let shares = parse_money(&raw_shares).ok_or_else(|| {
            BrokerError::Parse(format!("bad share count {raw_shares:?} for {ticker}"))
        })?;
        let shares = shares.trunc() as i64;
        let signed = match row.attr("data-type").as_deref() {
            Some(kind) if kind.eq_ignore_ascii_case("short") => shares.saturating_neg(),
            _ => shares,
        };

        let mut position = Position::new(ticker, signed);
        if let Some(symbol) = row.attr("data-symbol").filter(|s| !s.trim().is_empty()) {
            position = position.with_trading_symbol(TradingSymbol::new(symbol));
        }
        positions.push(position);
    }
    Ok(positions)
}

/// Venue symbol from a trade search result: `data-symbol` of the first `div.chip`.
pub fn parse_trading_symbol(html: &str) -> Option<TradingSymbol> {
    find_tag(html, "div", "chip")
        .and_then(|t| t.attr("data-symbol"))
        .filter(|s| !s.trim().is_empty())
        .map(TradingSymbol::new)
}

/// Last price from a stock info page: text of `p.data.bgLast`.
pub fn parse_last_price(html: &str) -> Option<f64> {
    let tag = find_tag(html, "p", "data bgLast")?;
    parse_money(&text_after(html, &tag)).filter(|p| *p > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_quoted_and_unquoted() {
        let tag = r#"<tr class="row" data-ticker="AAPL" data-shares=10 data-type='Short'>"#;
        assert_eq!(attr(tag, "data-ticker").as_deref(), Some("AAPL"));
        assert_eq!(attr(tag, "data-shares").as_deref(), Some("10"));
        assert_eq!(attr(tag, "data-type").as_deref(), Some("Short"));
        assert_eq!(attr(tag, "data-symbol"), None);
    }

    #[test]
    fn attr_requires_whole_name() {
        let tag = r#"<div xdata-symbol="NO" data-symbol="YES">"#;
        assert_eq!(attr(tag, "data-symbol").as_deref(), Some("YES"));
    }

    #[test]
    fn open_tags_skips_prefix_names() {
        let html = "<table><tbody><tr a=1><td>x</td><tr a=2></tbody></table>";
        let rows = open_tags(html, "tr");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].attr("a").as_deref(), Some("2"));
        // <tbody> must not match "t" + "body" style prefixes of other names
        assert_eq!(open_tags(html, "t").len(), 0);
    }

    #[test]
    fn class_matching() {
        let html = r#"<p class="data bgLast extra">1,234.50</p>"#;
        let tag = find_tag(html, "p", "data bgLast").unwrap();
        assert_eq!(text_after(html, &tag), "1,234.50");
        assert!(find_tag(html, "p", "data missing").is_none());
    }

    #[test]
    fn money() {
        assert_eq!(parse_money("$1,000,000.25"), Some(1_000_000.25));
        assert_eq!(parse_money(" 42 "), Some(42.0));
        assert_eq!(parse_money("n/a"), None);
    }

    #[test]
    fn out_of_range_short_count_saturates() {
        let page = r#"<table class="highlight">
            <tr data-ticker="X" data-shares="-1e30" data-type="Short"></tr>
            <tr data-ticker="Y" data-shares="1e30" data-type="Short"></tr>
        </table>"#;
        let rows = parse_holdings(page).unwrap();
        assert_eq!(rows[0].signed_shares, i64::MAX);
        assert_eq!(rows[1].signed_shares, -i64::MAX);
    }

    #[test]
    fn entities_decoded() {
        assert_eq!(attr(r#"<a t="AT&amp;T">"#, "t").as_deref(), Some("AT&T"));
    }
}
