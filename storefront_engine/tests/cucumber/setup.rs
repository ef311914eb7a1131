use std::time::Duration;

use cucumber::given;
use storefront_engine::data_types::MenuItem;

use crate::cucumber::StorefrontWorld;

const MENU: &str = r#"[
    {
        "id": 201, "name": "Quarter Pounder", "description": "Juicy quarter pound beef burger",
        "category": "Burgers", "basePrice": 4.99, "image": "burger.jpg",
        "sizes": [{"name": "Regular", "price": 0}, {"name": "Large", "price": 1.5}],
        "availableAddOns": [{"id": 1, "name": "Cheese", "price": 0.7}, {"id": 2, "name": "Bacon", "price": 1.2}]
    },
    {
        "id": 301, "name": "Fries", "description": "Crispy golden fries", "category": "Sides",
        "basePrice": 1.99, "image": "fries.jpg", "sizes": null, "addOns": null
    },
    {
        "id": "401", "name": "Milkshake", "description": "Thick vanilla shake", "category": "Drinks",
        "basePrice": 2.99, "image": "shake.jpg"
    }
]"#;

#[given("the kitchen is open")]
async fn kitchen_is_open(world: &mut StorefrontWorld) {
    let menu: Vec<MenuItem> = serde_json::from_str(MENU).expect("The test menu is not valid");
    world.kitchen.set_menu(menu);
}

#[given(expr = "a customer {string} with email {string} and password {string}")]
async fn customer(world: &mut StorefrontWorld, name: String, email: String, password: String) {
    world.kitchen.add_account(&email, &password, &name);
}

#[given(expr = "{string} placed order {word} {int} minutes ago, which is now {word}")]
async fn past_order(world: &mut StorefrontWorld, email: String, id: String, minutes: i64, status: String) {
    let status = status.parse().expect("Not a valid order status");
    world.kitchen.seed_order(&email, &id, status, minutes);
}

#[given("the status simulation is switched off")]
async fn no_simulation(world: &mut StorefrontWorld) {
    world.config.simulate_status = false;
}

#[given(expr = "new orders move to preparing after {int}ms")]
async fn simulation_delay(world: &mut StorefrontWorld, ms: u64) {
    world.config.simulate_status = true;
    world.config.simulation_delay = Duration::from_millis(ms);
}
