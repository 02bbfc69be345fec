//! Shared mappings for unit tests.

use std::sync::Arc;

use crate::mapping::{Cardinality, EntityMapping, MappingRegistry, PropertyDecl};

/// Articles translated through `translations`, with a translatable
/// collection (`comments`) and a plain one (`categories`).
pub fn article_registry() -> Arc<MappingRegistry> {
    Arc::new(
        MappingRegistry::new()
            .with(
                EntityMapping::new("Article", "id")
                    .with_field("date")
                    .with_association("translations", "ArticleTranslation", Cardinality::OneToMany)
                    .with_association("categories", "Category", Cardinality::ManyToMany)
                    .with_property(PropertyDecl::private("locale").locale())
                    .with_property(PropertyDecl::private("title").translatable("translations"))
                    .with_property(PropertyDecl::private("contents").translatable("translations"))
                    .with_property(PropertyDecl::private("comments").translatable("translations")),
            )
            .with(
                EntityMapping::new("ArticleTranslation", "id")
                    .with_field("locale")
                    .with_field("title")
                    .with_field("contents")
                    .with_association("comments", "Comment", Cardinality::ManyToMany)
                    .with_association("article", "Article", Cardinality::ManyToOne)
                    .with_property(PropertyDecl::private("locale").locale()),
            )
            .with(EntityMapping::new("Category", "id").with_field("title"))
            .with(EntityMapping::new("Comment", "id").with_field("content")),
    )
}

/// Products translated through two associations sharing one locale
/// property: `seo` (`slug`) and `translations` (`name`).
pub fn product_registry() -> Arc<MappingRegistry> {
    Arc::new(
        MappingRegistry::new()
            .with(
                EntityMapping::new("Product", "id")
                    .with_association("translations", "ProductTranslation", Cardinality::OneToMany)
                    .with_association("seo", "ProductSeo", Cardinality::OneToMany)
                    .with_property(PropertyDecl::private("locale").locale())
                    .with_property(PropertyDecl::private("name").translatable("translations"))
                    .with_property(PropertyDecl::private("slug").translatable("seo")),
            )
            .with(
                EntityMapping::new("ProductTranslation", "id")
                    .with_field("locale")
                    .with_field("name")
                    .with_property(PropertyDecl::private("locale").locale()),
            )
            .with(
                EntityMapping::new("ProductSeo", "id")
                    .with_field("locale")
                    .with_field("slug")
                    .with_property(PropertyDecl::private("locale").locale()),
            ),
    )
}
