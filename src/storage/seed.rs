use crate::domain::Product;

/// Bumping this reseeds any missing collections on the next startup.
pub const SCHEMA_VERSION: &str = "1.1.0";

/// Shared secret gating the admin surface. Stored hashed; this constant is
/// only used to seed a fresh store.
pub const DEFAULT_ADMIN_PIN: &str = "3604";

/// The initial catalog, loaded only when no product record exists yet.
/// Products live for the life of the deployment; there is no deletion.
pub fn seed_products() -> Vec<Product> {
    vec![
        Product::new("konyagi-std", "Konyagi (The Spirit of Nation)", "Spirit", 15000, 10500)
            .with_description("Tanzania's signature clear spirit, at home with tonic, ginger ale or ice.")
            .with_image("img/konyagi-std.jpg")
            .with_stock(50)
            .with_demand(500),
        Product::new("konyagi-fusion", "Konyagi Fusion (Flavored)", "Spirit", 16500, 11500)
            .with_description("The classic spirit infused with lemon, ginger and coconut variants.")
            .with_image("img/konyagi-fusion.jpg")
            .with_stock(30)
            .with_demand(180),
        Product::new("valeur-brandy", "Valeur Brandy", "Spirit", 18000, 12600)
            .with_description("Premium Tanzanian brandy with a mellow, warm character and smooth finish.")
            .with_image("img/valeur-brandy.jpg")
            .with_stock(25)
            .with_demand(120),
        Product::new("dodoma-brandy", "Dodoma Brandy-Style Spirit", "Spirit", 22000, 15400)
            .with_description("Rich fortified spirit from the heart of Dodoma, deep grape undertones.")
            .with_image("img/dodoma-brandy.jpg")
            .with_stock(15)
            .with_demand(95),
        Product::new("hansons-choice", "Hanson's Choice Brandy", "Spirit", 16000, 11200)
            .with_description("Consistent, smooth brandy distilled by East African Spirits.")
            .with_image("img/hansons-choice.jpg")
            .with_stock(20)
            .with_demand(65),
        Product::new("tzee-spirit", "Tzee Spirit", "Spirit", 14000, 9800)
            .with_description("Popular and affordable clear spirit, punchy and mixable.")
            .with_image("img/tzee-spirit.jpg")
            .with_stock(40)
            .with_demand(210),
        Product::new("kvant-spirit", "Kvant Premium Spirit", "Spirit", 17500, 12250)
            .with_description("High-purity neutral spirit distilled for smoothness.")
            .with_image("img/kvant-spirit.jpg")
            .with_stock(35)
            .with_demand(140),
        Product::new("captain-morgan", "Captain Morgan Spiced Gold", "Spirit", 45000, 31500)
            .with_description("Medium-bodied spiced rum blended from Caribbean rums and exotic spices.")
            .with_image("img/captain-morgan.jpg")
            .with_stock(25)
            .with_demand(55),
        Product::new("moet-brut", "Moet & Chandon Brut", "Champagne", 195000, 136500)
            .with_description("The iconic champagne, bright fruitiness since 1869.")
            .with_image("img/moet-brut.jpg")
            .with_stock(5)
            .with_demand(210),
        Product::new("safari-lager", "Safari Lager (Local)", "Beer", 3500, 2450)
            .with_description("Full-bodied Tanzanian lager, refreshing and deeply satisfying.")
            .with_image("img/safari-lager.jpg")
            .with_stock(120)
            .with_demand(450),
        Product::new("dodoma-red", "Dodoma Dry Red Wine", "Wine", 18000, 12600)
            .with_description("Classic red from the Dodoma vineyards; rich, earthy, full of character.")
            .with_image("img/dodoma-red.jpg")
            .with_stock(18)
            .with_demand(78),
    ]
}
