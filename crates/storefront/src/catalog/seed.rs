//! Built-in catalog used when no GraphQL backend is configured.

use optica_core::{Category, FrameDesign, Material, Price, Product, ProductId, Shape};

struct Seed {
    id: i32,
    slug: &'static str,
    name: &'static str,
    brand: &'static str,
    category: Category,
    price: u64,
    original_price: Option<u64>,
    rating: f32,
    review_count: u32,
    shape: Option<Shape>,
    material: Option<Material>,
    frame_design: Option<FrameDesign>,
    flags: (bool, bool, bool),
    features: &'static [&'static str],
    colors: &'static [&'static str],
}

impl From<&Seed> for Product {
    fn from(seed: &Seed) -> Self {
        let (is_on_sale, is_new, is_hot_deal) = seed.flags;
        Self {
            id: ProductId::new(seed.id),
            slug: seed.slug.to_string(),
            name: seed.name.to_string(),
            brand: seed.brand.to_string(),
            category: seed.category,
            price: Price::new(seed.price),
            original_price: seed.original_price.map(Price::new),
            rating: seed.rating,
            review_count: seed.review_count,
            shape: seed.shape,
            material: seed.material,
            frame_design: seed.frame_design,
            is_on_sale,
            is_new,
            is_hot_deal,
            features: seed.features.iter().map(ToString::to_string).collect(),
            colors: seed.colors.iter().map(ToString::to_string).collect(),
            description: None,
        }
    }
}

// (on sale, new, hot deal)
const SEEDS: &[Seed] = &[
    Seed {
        id: 1,
        slug: "ray-ban-rb5154-clubmaster",
        name: "Ray-Ban RB5154 Clubmaster",
        brand: "Ray-Ban",
        category: Category::Frame,
        price: 3_290_000,
        original_price: None,
        rating: 4.8,
        review_count: 214,
        shape: Some(Shape::Square),
        material: Some(Material::Acetate),
        frame_design: Some(FrameDesign::SemiRim),
        flags: (false, false, true),
        features: &["Bản lề kim loại", "Chính hãng Italy"],
        colors: &["#1b1b1b", "#6b3e26"],
    },
    Seed {
        id: 2,
        slug: "gentle-monster-lang-01",
        name: "Gentle Monster Lang 01",
        brand: "Gentle Monster",
        category: Category::Frame,
        price: 5_900_000,
        original_price: None,
        rating: 4.9,
        review_count: 87,
        shape: Some(Shape::Round),
        material: Some(Material::Acetate),
        frame_design: Some(FrameDesign::FullRim),
        flags: (false, true, false),
        features: &["Thiết kế Hàn Quốc"],
        colors: &["#000000"],
    },
    Seed {
        id: 3,
        slug: "optica-titan-air-round",
        name: "Optica Titan Air tròn",
        brand: "Optica",
        category: Category::Frame,
        price: 1_800_000,
        original_price: Some(2_200_000),
        rating: 4.6,
        review_count: 132,
        shape: Some(Shape::Round),
        material: Some(Material::Titanium),
        frame_design: Some(FrameDesign::FullRim),
        flags: (true, false, true),
        features: &["Siêu nhẹ 9g", "Chống dị ứng"],
        colors: &["#c0c0c0", "#d4af37"],
    },
    Seed {
        id: 4,
        slug: "optica-classic-round-gold",
        name: "Optica Classic tròn vàng",
        brand: "Optica",
        category: Category::Frame,
        price: 2_500_000,
        original_price: None,
        rating: 4.6,
        review_count: 58,
        shape: Some(Shape::Round),
        material: Some(Material::Metal),
        frame_design: Some(FrameDesign::FullRim),
        flags: (false, false, false),
        features: &["Đệm mũi silicon"],
        colors: &["#d4af37"],
    },
    Seed {
        id: 5,
        slug: "parim-tr90-rectangle",
        name: "Parim TR90 chữ nhật",
        brand: "Parim",
        category: Category::Frame,
        price: 800_000,
        original_price: Some(1_000_000),
        rating: 4.3,
        review_count: 301,
        shape: Some(Shape::Rectangle),
        material: Some(Material::Tr90),
        frame_design: Some(FrameDesign::FullRim),
        flags: (true, false, false),
        features: &["Dẻo, khó gãy"],
        colors: &["#1b1b1b", "#2c3e50", "#7f1d1d"],
    },
    Seed {
        id: 6,
        slug: "molsion-cat-eye-ms3021",
        name: "Molsion Cat-eye MS3021",
        brand: "Molsion",
        category: Category::Frame,
        price: 1_600_000,
        original_price: None,
        rating: 4.5,
        review_count: 76,
        shape: Some(Shape::CatEye),
        material: Some(Material::Acetate),
        frame_design: Some(FrameDesign::FullRim),
        flags: (false, true, false),
        features: &["Dáng mắt mèo thời trang"],
        colors: &["#7f1d1d", "#f5d0c5"],
    },
    Seed {
        id: 7,
        slug: "optica-rimless-feather",
        name: "Optica Feather không gọng",
        brand: "Optica",
        category: Category::Frame,
        price: 2_100_000,
        original_price: None,
        rating: 4.4,
        review_count: 39,
        shape: Some(Shape::Oval),
        material: Some(Material::Titanium),
        frame_design: Some(FrameDesign::Rimless),
        flags: (false, true, false),
        features: &["Khoan ốc titan"],
        colors: &["#c0c0c0"],
    },
    Seed {
        id: 8,
        slug: "parim-half-rim-business",
        name: "Parim nửa gọng Business",
        brand: "Parim",
        category: Category::Frame,
        price: 1_250_000,
        original_price: Some(1_450_000),
        rating: 4.5,
        review_count: 120,
        shape: Some(Shape::Rectangle),
        material: Some(Material::Metal),
        frame_design: Some(FrameDesign::SemiRim),
        flags: (true, false, false),
        features: &["Phong cách công sở"],
        colors: &["#1b1b1b", "#4b5563"],
    },
    Seed {
        id: 9,
        slug: "ray-ban-aviator-classic",
        name: "Ray-Ban Aviator Classic RB3025",
        brand: "Ray-Ban",
        category: Category::Sunglasses,
        price: 4_200_000,
        original_price: Some(4_800_000),
        rating: 4.9,
        review_count: 512,
        shape: Some(Shape::Aviator),
        material: Some(Material::Metal),
        frame_design: Some(FrameDesign::FullRim),
        flags: (true, false, true),
        features: &["Tròng G-15 chống UV400", "Chính hãng Italy"],
        colors: &["#d4af37", "#1b1b1b"],
    },
    Seed {
        id: 10,
        slug: "oakley-holbrook-prizm",
        name: "Oakley Holbrook Prizm",
        brand: "Oakley",
        category: Category::Sunglasses,
        price: 3_900_000,
        original_price: None,
        rating: 4.7,
        review_count: 198,
        shape: Some(Shape::Square),
        material: Some(Material::Plastic),
        frame_design: Some(FrameDesign::FullRim),
        flags: (false, true, false),
        features: &["Tròng Prizm tăng tương phản"],
        colors: &["#111827", "#1e3a8a"],
    },
    Seed {
        id: 11,
        slug: "gentle-monster-her-01",
        name: "Gentle Monster Her 01",
        brand: "Gentle Monster",
        category: Category::Sunglasses,
        price: 6_500_000,
        original_price: None,
        rating: 4.8,
        review_count: 64,
        shape: Some(Shape::CatEye),
        material: Some(Material::Acetate),
        frame_design: Some(FrameDesign::FullRim),
        flags: (false, true, true),
        features: &["Chống UV400"],
        colors: &["#000000", "#6b3e26"],
    },
    Seed {
        id: 12,
        slug: "optica-sun-oval-polarized",
        name: "Optica Sun oval phân cực",
        brand: "Optica",
        category: Category::Sunglasses,
        price: 950_000,
        original_price: Some(1_300_000),
        rating: 4.2,
        review_count: 45,
        shape: Some(Shape::Oval),
        material: Some(Material::Tr90),
        frame_design: Some(FrameDesign::FullRim),
        flags: (true, false, false),
        features: &["Tròng phân cực", "Chống UV400"],
        colors: &["#1b1b1b", "#92400e"],
    },
    Seed {
        id: 13,
        slug: "essilor-crizal-rock",
        name: "Essilor Crizal Rock 1.56",
        brand: "Essilor",
        category: Category::Lens,
        price: 1_450_000,
        original_price: None,
        rating: 4.7,
        review_count: 260,
        shape: None,
        material: None,
        frame_design: None,
        flags: (false, false, false),
        features: &["Chống trầy", "Chống bám nước"],
        colors: &[],
    },
    Seed {
        id: 14,
        slug: "hoya-bluecontrol-160",
        name: "Hoya BlueControl 1.60",
        brand: "Hoya",
        category: Category::Lens,
        price: 1_900_000,
        original_price: Some(2_300_000),
        rating: 4.6,
        review_count: 174,
        shape: None,
        material: None,
        frame_design: None,
        flags: (true, false, true),
        features: &["Lọc ánh sáng xanh", "Mỏng 1.60"],
        colors: &[],
    },
    Seed {
        id: 15,
        slug: "chemi-u2-photochromic",
        name: "Chemi U2 đổi màu",
        brand: "Chemi",
        category: Category::Lens,
        price: 1_100_000,
        original_price: None,
        rating: 4.4,
        review_count: 92,
        shape: None,
        material: None,
        frame_design: None,
        flags: (false, true, false),
        features: &["Đổi màu khi ra nắng"],
        colors: &[],
    },
    Seed {
        id: 16,
        slug: "molsion-square-ms7002",
        name: "Molsion Square MS7002",
        brand: "Molsion",
        category: Category::Frame,
        price: 1_350_000,
        original_price: None,
        rating: 4.5,
        review_count: 51,
        shape: Some(Shape::Square),
        material: Some(Material::Acetate),
        frame_design: Some(FrameDesign::FullRim),
        flags: (false, false, false),
        features: &["Acetate Ý"],
        colors: &["#1b1b1b", "#a16207"],
    },
];

/// The built-in catalog, in display order.
#[must_use]
pub fn products() -> Vec<Product> {
    SEEDS.iter().map(Product::from).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_seed_records_are_valid() {
        for product in products() {
            assert!(product.validate().is_ok(), "{}", product.slug);
        }
    }

    #[test]
    fn test_seed_ids_and_slugs_unique() {
        let products = products();
        let ids: HashSet<_> = products.iter().map(|p| p.id).collect();
        let slugs: HashSet<_> = products.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(ids.len(), products.len());
        assert_eq!(slugs.len(), products.len());
    }

    #[test]
    fn test_lenses_have_no_frame_tags() {
        for product in products().iter().filter(|p| p.category == Category::Lens) {
            assert!(product.shape.is_none());
            assert!(product.frame_design.is_none());
        }
    }
}
