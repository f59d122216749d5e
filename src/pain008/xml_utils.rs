use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::{Decimal, RoundingStrategy};
use std::io::Cursor;

use crate::core::LastschriftError;

pub type XmlResult = Result<String, LastschriftError>;

fn xml_io(e: std::io::Error) -> LastschriftError {
    LastschriftError::Xml(format!("XML write error: {e}"))
}

/// Thin element-oriented wrapper over the quick-xml writer.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Result<Self, LastschriftError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self { writer })
    }

    pub fn into_string(self) -> XmlResult {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| LastschriftError::Xml(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, LastschriftError> {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, LastschriftError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, LastschriftError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, LastschriftError> {
        self.start_element(name)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    pub fn text_element_with_attrs(
        &mut self,
        name: &str,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, LastschriftError> {
        self.start_element_with_attrs(name, attrs)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    /// Write an amount with its `Ccy` attribute.
    pub fn amount_element(
        &mut self,
        name: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<&mut Self, LastschriftError> {
        self.text_element_with_attrs(name, &format_amount(amount), &[("Ccy", currency)])
    }

    /// Write `<outer><Id>{id}</Id></outer>`-style nesting for a path of elements.
    pub fn nested_text(&mut self, path: &[&str], text: &str) -> Result<&mut Self, LastschriftError> {
        let Some((leaf, parents)) = path.split_last() else {
            return Ok(self);
        };
        for p in parents {
            self.start_element(p)?;
        }
        self.text_element(leaf, text)?;
        for p in parents.iter().rev() {
            self.end_element(p)?;
        }
        Ok(self)
    }
}

/// Format an amount with exactly two decimals, as pain.008 amounts require.
pub fn format_amount(d: Decimal) -> String {
    let rounded = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn format_amount_cases() {
        assert_eq!(format_amount(dec!(42)), "42.00");
        assert_eq!(format_amount(dec!(11.0)), "11.00");
        assert_eq!(format_amount(dec!(49.90)), "49.90");
        assert_eq!(format_amount(dec!(0.005)), "0.01");
        assert_eq!(format_amount(dec!(1833.484)), "1833.48");
    }

    #[test]
    fn nested_text_writes_path() {
        let mut w = XmlWriter::new().unwrap();
        w.nested_text(&["CdtrAcct", "Id", "IBAN"], "DE89370400440532013000")
            .unwrap();
        let xml = w.into_string().unwrap();
        assert!(xml.contains("<CdtrAcct>"));
        assert!(xml.contains("<IBAN>DE89370400440532013000</IBAN>"));
        assert!(xml.contains("</CdtrAcct>"));
    }
}
