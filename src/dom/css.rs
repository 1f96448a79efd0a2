//! Stylesheet scanning and inline style parsing.
//!
//! Classification only needs to know which class names a stylesheet
//! declares, and the extractor only needs a handful of positional
//! properties from inline `style` attributes, so this is a narrow
//! cssparser front end rather than a cascade.

use cssparser::{
    AtRuleParser, DeclarationParser, ParseError, Parser, ParserInput, QualifiedRuleParser,
    RuleBodyItemParser, RuleBodyParser, StyleSheetParser, Token,
};

/// A qualified rule from a stylesheet: the classes its selectors name plus
/// its declarations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclaredRule {
    pub classes: Vec<String>,
    pub declarations: Vec<Declaration>,
}

/// A CSS declaration (property: value).
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: PropertyValue,
}

/// Parsed CSS property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// A length in CSS pixels (unitless zero included).
    Px(f32),
    /// `translate(x, y)` offsets in pixels.
    Translate { x: f32, y: f32 },
    Keyword(String),
    None,
}

impl Declaration {
    pub fn px(&self) -> Option<f32> {
        match self.value {
            PropertyValue::Px(v) => Some(v),
            _ => None,
        }
    }
}

/// List every qualified rule of a stylesheet. At-rules are skipped.
pub fn scan_stylesheet(css: &str) -> Vec<DeclaredRule> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut rules = Vec::new();

    let mut rule_parser = TopLevelRuleParser { rules: &mut rules };
    for result in StyleSheetParser::new(&mut parser, &mut rule_parser) {
        // Lenient: a broken rule is dropped, the rest still count
        let _ = result;
    }

    rules
}

/// Parse the declarations of an inline `style` attribute.
pub fn parse_inline_style(style: &str) -> Vec<Declaration> {
    let mut input = ParserInput::new(style);
    let mut parser = Parser::new(&mut input);
    let mut declarations = Vec::new();

    let mut decl_parser = DeclarationListParser {
        declarations: &mut declarations,
    };
    for result in RuleBodyParser::new(&mut parser, &mut decl_parser) {
        let _ = result;
    }

    declarations
}

struct TopLevelRuleParser<'a> {
    rules: &'a mut Vec<DeclaredRule>,
}

impl<'i> AtRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &cssparser::ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = Vec<String>;
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let mut classes = Vec::new();
        let mut after_dot = false;

        while let Ok(token) = input.next_including_whitespace() {
            match token {
                Token::Delim('.') => {
                    after_dot = true;
                    continue;
                }
                Token::Ident(name) if after_dot => {
                    let name = name.to_string();
                    if !classes.contains(&name) {
                        classes.push(name);
                    }
                }
                _ => {}
            }
            after_dot = false;
        }

        Ok(classes)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &cssparser::ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let mut declarations = Vec::new();
        let mut decl_parser = DeclarationListParser {
            declarations: &mut declarations,
        };
        for result in RuleBodyParser::new(input, &mut decl_parser) {
            let _ = result;
        }

        self.rules.push(DeclaredRule {
            classes: prelude,
            declarations,
        });
        Ok(())
    }
}

struct DeclarationListParser<'a> {
    declarations: &'a mut Vec<Declaration>,
}

impl<'i> AtRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &cssparser::ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &cssparser::ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> DeclarationParser<'i> for DeclarationListParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &cssparser::ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let property = name.to_ascii_lowercase();
        let value = parse_property_value(&property, input);
        // Drop whatever the value parser left behind (e.g. `!important`)
        while input.next().is_ok() {}

        self.declarations.push(Declaration { property, value });
        Ok(())
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for DeclarationListParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

fn parse_property_value(property: &str, input: &mut Parser<'_, '_>) -> PropertyValue {
    let value = match property {
        "top" | "left" | "height" | "width" | "line-height" | "font-size" => parse_px(input),
        "transform" => input.try_parse(parse_translate).ok(),
        "font-style" | "font-weight" | "position" => input
            .expect_ident_cloned()
            .ok()
            .map(|ident| PropertyValue::Keyword(ident.to_ascii_lowercase())),
        _ => None,
    };
    value.unwrap_or(PropertyValue::None)
}

fn parse_px(input: &mut Parser<'_, '_>) -> Option<PropertyValue> {
    match input.next().ok()? {
        Token::Dimension { value, unit, .. } if unit.eq_ignore_ascii_case("px") => {
            Some(PropertyValue::Px(*value))
        }
        Token::Number { value, .. } => Some(PropertyValue::Px(*value)),
        _ => None,
    }
}

fn parse_translate<'i>(input: &mut Parser<'i, '_>) -> Result<PropertyValue, ParseError<'i, ()>> {
    input.expect_function_matching("translate")?;
    input.parse_nested_block(|input| {
        let x = parse_length_component(input)?;
        let y = if input.try_parse(|i| i.expect_comma()).is_ok() {
            parse_length_component(input)?
        } else {
            0.0
        };
        Ok(PropertyValue::Translate { x, y })
    })
}

fn parse_length_component<'i>(input: &mut Parser<'i, '_>) -> Result<f32, ParseError<'i, ()>> {
    let location = input.current_source_location();
    match input.next()? {
        Token::Dimension { value, .. } | Token::Number { value, .. } => Ok(*value),
        _ => Err(location.new_custom_error(())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_collects_classes() {
        let css = "p.Platte-tekst { font-style: normal; }\n\
                   span.CharOverride-3, .Auteur { font-style: italic; }";
        let rules = scan_stylesheet(css);

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].classes, ["Platte-tekst"]);
        assert_eq!(rules[1].classes, ["CharOverride-3", "Auteur"]);
        assert_eq!(
            rules[1].declarations[0].value,
            PropertyValue::Keyword("italic".to_string())
        );
    }

    #[test]
    fn test_scan_skips_at_rules() {
        let css = "@font-face { font-family: X; } p.Titel { color: red; }";
        let rules = scan_stylesheet(css);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].classes, ["Titel"]);
    }

    #[test]
    fn test_scan_compound_selector() {
        let rules = scan_stylesheet("div.Kader p.Kader-tekst { margin: 0 }");
        assert_eq!(rules[0].classes, ["Kader", "Kader-tekst"]);
    }

    #[test]
    fn test_inline_position() {
        let decls = parse_inline_style("position:absolute;top:120.5px;left:10px;height:40px");
        let top = decls.iter().find(|d| d.property == "top").and_then(Declaration::px);
        let height = decls.iter().find(|d| d.property == "height").and_then(Declaration::px);
        assert_eq!(top, Some(120.5));
        assert_eq!(height, Some(40.0));
    }

    #[test]
    fn test_inline_translate() {
        let decls = parse_inline_style("transform: translate(36px, 512.25px)");
        assert_eq!(
            decls[0].value,
            PropertyValue::Translate { x: 36.0, y: 512.25 }
        );
    }
}
