use super::catalog::{AssetCatalog, Category, Template};
use super::color::{ColorCategory, ColorSet};
use crate::error::RenderError;
use super::selector::{AccessorySet, Selection};
use super::vanity::VanityContent;

/// 图层绘制顺序（背景与身体之后）
pub const Z_ORDER: [Category; Category::COUNT] = [
    Category::ShirtPants,
    Category::TailAccessory,
    Category::Shoes,
    Category::Mouth,
    Category::Misc,
    Category::Glasses,
    Category::Hat,
];

/// 统一的图层计划：渲染逻辑不关心选择结果来自摘要还是 vanity
struct LayerPlan<'a> {
    background: bool,
    colors: &'a ColorSet,
    layers: Vec<(&'static str, &'a Template)>,
}

impl<'a> LayerPlan<'a> {
    fn from_selection(catalog: &'a AssetCatalog, selection: &'a Selection<'a>) -> Self {
        match selection {
            Selection::DigestDriven(set) => Self::from_accessories(catalog, set),
            Selection::VanityFixed {
                vanity,
                with_background,
            } => {
                let background = *with_background && vanity.background;
                match &vanity.content {
                    VanityContent::Artwork(template) => Self {
                        background,
                        colors: &vanity.colors,
                        layers: vec![("vanity", template)],
                    },
                    VanityContent::Accessories(_) => {
                        let mut layers = vec![("body", &catalog.body().template)];
                        for category in Z_ORDER {
                            if let Some(asset) = vanity
                                .accessory_id(category)
                                .and_then(|id| catalog.find_asset(category, id))
                            {
                                layers.push((category.name(), &asset.template));
                            }
                        }
                        Self {
                            background,
                            colors: &vanity.colors,
                            layers,
                        }
                    }
                }
            }
        }
    }

    fn from_accessories(catalog: &'a AssetCatalog, set: &'a AccessorySet<'a>) -> Self {
        let mut layers = vec![("body", &catalog.body().template)];
        for category in Z_ORDER {
            if let Some(asset) = set.asset(category) {
                layers.push((category.name(), &asset.template));
            }
        }
        Self {
            background: set.with_background(),
            colors: set.colors(),
            layers,
        }
    }
}

/// 把选择结果合成为单个 SVG 文档。
///
/// 输出只依赖输入：不含时间戳、随机 ID，属性顺序固定，相同输入逐字节一致。
pub fn compose(catalog: &AssetCatalog, selection: &Selection<'_>) -> Result<String, RenderError> {
    let plan = LayerPlan::from_selection(catalog, selection);
    let canvas = catalog.canvas();

    let mut out = String::with_capacity(4096);
    out.push_str(&canvas.open_tag());
    if plan.background {
        out.push_str(&format!(
            r#"<rect width="{}" height="{}" fill="{}"/>"#,
            canvas.width,
            canvas.height,
            plan.colors.get(ColorCategory::Background).to_html()
        ));
    }
    for (name, template) in &plan.layers {
        out.push_str(r#"<g id=""#);
        out.push_str(name);
        out.push_str(r#"">"#);
        out.push_str(&catalog.render_template(template, plan.colors)?);
        out.push_str("</g>");
    }
    out.push_str("</svg>");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{Z_ORDER, compose};
    use crate::features::animal::catalog::{
        Asset, AssetCatalog, Canvas, Category, CategoryAssets, TemplateSet,
    };
    use crate::features::animal::color::{Color, ColorCategory, ColorSet};
    use crate::features::animal::selector::{AccessorySet, Selection};
    use crate::features::animal::vanity::{VanityAsset, VanityContent};

    fn catalog() -> AssetCatalog {
        let mut templates = TemplateSet::new();
        let categories = Category::ALL
            .into_iter()
            .map(|c| {
                let template = templates
                    .add(
                        &format!("{}/one", c.name()),
                        &format!(r#"<rect class="{}" fill="{{{{ accent }}}}"/>"#, c.name()),
                    )
                    .expect("template");
                (
                    c,
                    CategoryAssets {
                        allow_none: true,
                        assets: vec![Asset {
                            id: format!("{}-one", c.name()),
                            category: Some(c),
                            template,
                        }],
                    },
                )
            })
            .collect();
        let body = Asset {
            id: "body".into(),
            category: None,
            template: templates
                .add("body", r#"<circle fill="{{ fur }}"/>"#)
                .expect("body"),
        };
        let vanity = VanityAsset {
            address: "paw_1vanity".into(),
            name: "artwork".into(),
            background: false,
            colors: ColorSet::new([Color::rgb(9, 9, 9); ColorCategory::COUNT]),
            content: VanityContent::Artwork(
                templates
                    .add("vanity/paw_1vanity", r#"<path d="M0 0"/>"#)
                    .expect("artwork"),
            ),
        };
        AssetCatalog::new(
            Canvas {
                width: 100,
                height: 100,
            },
            templates,
            body,
            categories,
            vec![vanity],
        )
        .expect("catalog")
    }

    fn colors() -> ColorSet {
        ColorSet::new([
            Color::rgb(1, 1, 1),
            Color::rgb(2, 2, 2),
            Color::rgb(3, 3, 3),
            Color::rgb(4, 4, 4),
            Color::rgb(5, 5, 5),
        ])
    }

    #[test]
    fn layers_follow_z_order_and_skip_missing_categories() {
        let catalog = catalog();
        let mut assets = [None; Category::COUNT];
        for c in [Category::Hat, Category::ShirtPants, Category::Glasses] {
            assets[c.index()] = catalog.list_category(c).first();
        }
        let selection = Selection::DigestDriven(AccessorySet::new(assets, colors(), true));
        let svg = compose(&catalog, &selection).expect("compose");

        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="100""#));
        assert!(svg.contains(r##"<rect width="100" height="100" fill="#010101"/>"##));
        assert!(svg.contains(r##"<g id="body"><circle fill="#020202"/></g>"##));
        assert!(!svg.contains(r#"id="mouth""#));
        assert!(!svg.contains("<g></g>"));

        let pos = |name: &str| svg.find(&format!(r#"<g id="{name}">"#)).expect("layer");
        assert!(pos("body") < pos("shirt_pants"));
        assert!(pos("shirt_pants") < pos("glasses"));
        assert!(pos("glasses") < pos("hat"));
        assert_eq!(Z_ORDER.last(), Some(&Category::Hat));
    }

    #[test]
    fn background_flag_only_drops_background_layer() {
        let catalog = catalog();
        let assets = [None; Category::COUNT];
        let with = compose(
            &catalog,
            &Selection::DigestDriven(AccessorySet::new(assets, colors(), true)),
        )
        .expect("compose");
        let without = compose(
            &catalog,
            &Selection::DigestDriven(AccessorySet::new(assets, colors(), false)),
        )
        .expect("compose");
        assert!(with.contains("<rect width="));
        assert!(!without.contains("<rect width="));
        assert_eq!(with.replace(r##"<rect width="100" height="100" fill="#010101"/>"##, ""), without);
    }

    #[test]
    fn artwork_vanity_ignores_background_when_not_eligible() {
        let catalog = catalog();
        let vanity = catalog.lookup_vanity("paw_1vanity").expect("vanity");
        let svg = compose(
            &catalog,
            &Selection::VanityFixed {
                vanity,
                with_background: true,
            },
        )
        .expect("compose");
        assert_eq!(
            svg,
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100">"#,
                r#"<g id="vanity"><path d="M0 0"/></g></svg>"#
            )
        );
    }

    #[test]
    fn output_is_byte_identical_across_calls() {
        let catalog = catalog();
        let mut assets = [None; Category::COUNT];
        assets[Category::Mouth.index()] = catalog.list_category(Category::Mouth).first();
        let selection = Selection::DigestDriven(AccessorySet::new(assets, colors(), true));
        let first = compose(&catalog, &selection).expect("compose");
        let second = compose(&catalog, &selection).expect("compose");
        assert_eq!(first, second);
    }
}
