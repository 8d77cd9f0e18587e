/// XMP sidecar serialization
///
/// Lightroom and Camera Raw only pick up the sidecar when it matches the
/// layout they write themselves, so the header, namespace list, attribute
/// order and tab indentation are reproduced exactly.

use std::fmt::Write;

use crate::translate::{TargetAttributeSet, ToneCurve};

const HEADER: &str = concat!(
    "<x:xmpmeta xmlns:x=\"adobe:ns:meta/\" x:xmptk=\"Adobe XMP Core 7.0-c000 1.000000, 0000/00/00-00:00:00\">\n",
    "\t<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\n",
    "\t\t<rdf:Description rdf:about=\"\" \n",
    "\t\t\txmlns:xmp=\"http://ns.adobe.com/xap/1.0/\"\n",
    "\t\t\txmlns:tiff=\"http://ns.adobe.com/tiff/1.0/\"\n",
    "\t\t\txmlns:crs=\"http://ns.adobe.com/camera-raw-settings/1.0/\"\n",
    "\t\t\txmlns:dc=\"http://purl.org/dc/elements/1.1/\"\t\t\n",
);

const FOOTER: &str = "\n\t\t</rdf:Description>\n\t</rdf:RDF>\n</x:xmpmeta>";

/// Render the sidecar document for one photo
pub fn render(set: &TargetAttributeSet) -> String {
    let mut xml = String::from(HEADER);

    // write! into a String cannot fail
    let _ = write!(
        xml,
        "\t\t\tWBAdjRGGBLevels=\"{}\"\t\t\t\n\t\t\tcrs:Version=\"15.3\"\n\t\t\tcrs:ProcessVersion=\"11.0\"\n\t\t\tcrs:WhiteBalance=\"{}\"",
        escape(&set.rggb_levels),
        escape(&set.white_balance)
    );

    for attribute in &set.attributes {
        let _ = write!(xml, "\n\t\t\t{}=\"{}\"", attribute.name, escape(&attribute.value));
    }

    let _ = write!(
        xml,
        "\n\t\t\tcrs:LensProfileEnable=\"{}\"\n\t\t\tcrs:ToneCurveName2012=\"Linear\"\n\t\t\tcrs:HasSettings=\"True\"\n\t\t\tcrs:AlreadyApplied=\"False\">",
        if set.lens_profile_enable { 1 } else { 0 }
    );

    for curve in &set.tone_curves {
        render_curve(&mut xml, curve);
    }

    if let Some(look) = set.look.as_ref().filter(|look| look.convert_to_grayscale) {
        let _ = write!(
            xml,
            "\n\t\t\t<crs:Look>\n\t\t\t\t<rdf:Description crs:Name=\"{}\">\n\t\t\t\t\t<crs:Parameters>\n\t\t\t\t\t\t<rdf:Description crs:ConvertToGrayscale=\"True\">\n\t\t\t\t\t\t</rdf:Description>\n\t\t\t\t\t</crs:Parameters>\t\t\t\t\n\t\t\t\t</rdf:Description>\n\t\t\t</crs:Look>",
            escape(&look.name)
        );
    }

    if !set.keywords.is_empty() {
        xml.push_str("\n\t\t\t<dc:subject><rdf:Bag>");
        for keyword in &set.keywords {
            let _ = write!(xml, "<rdf:li>{}</rdf:li>", escape(keyword));
        }
        xml.push_str("</rdf:Bag></dc:subject>");
    }

    xml.push_str(FOOTER);
    xml
}

fn render_curve(xml: &mut String, curve: &ToneCurve) {
    let name = format!("crs:ToneCurvePV2012{}", curve.channel.suffix());
    let _ = write!(xml, "\n\t\t\t\t<{}>\n\t\t\t\t\t<rdf:Seq>", name);
    for (x, y) in &curve.points {
        let _ = write!(xml, "\n\t\t\t\t\t<rdf:li>{}, {}</rdf:li>", x, y);
    }
    let _ = write!(xml, "\n\t\t\t\t\t</rdf:Seq>\n\t\t\t\t</{}>", name);
}

/// Escape the characters that would break an attribute or text node
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::{Attribute, CurveChannel, FieldMapping, GrayscaleLook};

    fn basic_set() -> TargetAttributeSet {
        let mut set = TargetAttributeSet::new();
        set.rggb_levels = "2048 1024 1024 1500".to_string();
        set.white_balance = "Custom".to_string();
        set.apply(FieldMapping::many(vec![
            Attribute::new("crs:Temperature", "4300"),
            Attribute::new("crs:Tint", "0"),
        ]));
        set.apply(FieldMapping::single("crs:Exposure2012", "+0.33".to_string()));
        set
    }

    #[test]
    fn test_render_exact_document() {
        let expected = concat!(
            "<x:xmpmeta xmlns:x=\"adobe:ns:meta/\" x:xmptk=\"Adobe XMP Core 7.0-c000 1.000000, 0000/00/00-00:00:00\">\n",
            "\t<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\n",
            "\t\t<rdf:Description rdf:about=\"\" \n",
            "\t\t\txmlns:xmp=\"http://ns.adobe.com/xap/1.0/\"\n",
            "\t\t\txmlns:tiff=\"http://ns.adobe.com/tiff/1.0/\"\n",
            "\t\t\txmlns:crs=\"http://ns.adobe.com/camera-raw-settings/1.0/\"\n",
            "\t\t\txmlns:dc=\"http://purl.org/dc/elements/1.1/\"\t\t\n",
            "\t\t\tWBAdjRGGBLevels=\"2048 1024 1024 1500\"\t\t\t\n",
            "\t\t\tcrs:Version=\"15.3\"\n",
            "\t\t\tcrs:ProcessVersion=\"11.0\"\n",
            "\t\t\tcrs:WhiteBalance=\"Custom\"\n",
            "\t\t\tcrs:Temperature=\"4300\"\n",
            "\t\t\tcrs:Tint=\"0\"\n",
            "\t\t\tcrs:Exposure2012=\"+0.33\"\n",
            "\t\t\tcrs:LensProfileEnable=\"1\"\n",
            "\t\t\tcrs:ToneCurveName2012=\"Linear\"\n",
            "\t\t\tcrs:HasSettings=\"True\"\n",
            "\t\t\tcrs:AlreadyApplied=\"False\">\n",
            "\t\t</rdf:Description>\n",
            "\t</rdf:RDF>\n",
            "</x:xmpmeta>"
        );
        assert_eq!(render(&basic_set()), expected);
    }

    #[test]
    fn test_render_nested_elements() {
        let mut set = basic_set();
        set.lens_profile_enable = false;
        set.tone_curves.push(ToneCurve {
            channel: CurveChannel::Red,
            points: vec![(0, 0), (255, 250)],
        });
        set.look = Some(GrayscaleLook {
            name: "Adobe Monochrome".to_string(),
            convert_to_grayscale: true,
        });
        set.keywords.push("DPP3:CheckMark=1".to_string());

        let xml = render(&set);
        assert!(xml.contains("crs:LensProfileEnable=\"0\""));
        assert!(xml.contains(concat!(
            "crs:AlreadyApplied=\"False\">\n",
            "\t\t\t\t<crs:ToneCurvePV2012Red>\n",
            "\t\t\t\t\t<rdf:Seq>\n",
            "\t\t\t\t\t<rdf:li>0, 0</rdf:li>\n",
            "\t\t\t\t\t<rdf:li>255, 250</rdf:li>\n",
            "\t\t\t\t\t</rdf:Seq>\n",
            "\t\t\t\t</crs:ToneCurvePV2012Red>\n",
            "\t\t\t<crs:Look>\n",
            "\t\t\t\t<rdf:Description crs:Name=\"Adobe Monochrome\">\n",
            "\t\t\t\t\t<crs:Parameters>\n",
            "\t\t\t\t\t\t<rdf:Description crs:ConvertToGrayscale=\"True\">\n",
            "\t\t\t\t\t\t</rdf:Description>\n",
            "\t\t\t\t\t</crs:Parameters>\t\t\t\t\n",
            "\t\t\t\t</rdf:Description>\n",
            "\t\t\t</crs:Look>\n",
            "\t\t\t<dc:subject><rdf:Bag><rdf:li>DPP3:CheckMark=1</rdf:li></rdf:Bag></dc:subject>\n",
            "\t\t</rdf:Description>"
        )));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }
}
