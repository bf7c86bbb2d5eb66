use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use tracing::info;
use eat_where_client::config::{Command, Config};
use eat_where_client::controller::nearby_search_controller::{SearchOutcome, SearchRequest};
use eat_where_client::controller::session_controller::AuthState;
use eat_where_client::controller::AppState;
use eat_where_client::models::location::{Coordinates, NEAR_ME};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    let app = AppState::from_config(&config).context("Error setting up the API clients")?;

    if !matches!(config.command, Command::Login { .. }) {
        match app.session.restore().await {
            AuthState::Authenticated(user) => info!("Signed in as {}", user.email),
            _ => info!("No active session"),
        }
    }

    run(&app, config.command).await
}

/// Coordinates without a province search around that point; an explicit province wins.
fn search_request(
    query: Option<String>,
    province: Option<String>,
    lat_lon: Option<(f64, f64)>,
    radius: Option<u32>,
) -> SearchRequest {
    let user_location = lat_lon.map(|(lat, lon)| Coordinates::new(lat, lon));
    let province_id = match (province, user_location) {
        (Some(province), _) => Some(province),
        (None, Some(_)) => Some(NEAR_ME.to_string()),
        (None, None) => None,
    };
    SearchRequest {
        query,
        province_id,
        user_location,
        radius,
    }
}

async fn run(app: &AppState, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Search {
            query,
            province,
            lat,
            lon,
            radius,
        } => {
            let outcome = app
                .search
                .search(search_request(query, province, lat.zip(lon), radius))
                .await;
            if let SearchOutcome::Fresh(results) = outcome {
                println!(
                    "{} places within {}m of [{}, {}]",
                    results.places.len(),
                    results.radius,
                    results.center.latitude,
                    results.center.longitude
                );
                for place in results.places {
                    let rating = place.rating.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "-".to_string());
                    println!("{}\t{}\t{}\t{}", place.id, rating, place.name, place.address);
                }
            }
        }
        Command::Favorite { restaurant_id } => {
            let outcome = app
                .bookmarks
                .toggle(&restaurant_id)
                .await
                .context("Error updating favorites")?;
            let verb = if outcome.is_favorite { "added to" } else { "removed from" };
            println!("{} {} favorites ({} total)", restaurant_id, verb, outcome.favorites.len());
        }
        Command::Favorites => {
            let restaurants = app
                .bookmarks
                .favorite_restaurants()
                .await
                .context("Error retrieving favorites")?;
            for restaurant in restaurants {
                println!("{}\t{}\t{}", restaurant.id, restaurant.name, restaurant.address);
            }
        }
        Command::Menu { restaurant_id } => {
            let foods = app
                .search
                .menu(&restaurant_id)
                .await
                .context("Error retrieving the menu")?;
            for food in foods {
                let price = food.price.map(|p| format!("{:.0}", p)).unwrap_or_default();
                println!("{}\t{}\t{}", food.id, food.name, price);
            }
        }
        Command::Review {
            target,
            target_id,
            rating,
            comment,
        } => {
            let mut board = app.reviews.load(target, &target_id).await.context("Error loading reviews")?;
            app.reviews
                .submit(&mut board, rating, &comment)
                .await
                .context("Error submitting review")?;
            if let Some(current) = board.current_rating {
                println!("Thanks! {} is now rated {:.1}", target_id, current);
            }
        }
        Command::Reviews { target, target_id } => {
            let board = app.reviews.load(target, &target_id).await.context("Error loading reviews")?;
            if let Some(current) = board.current_rating {
                println!("Rated {:.1} from {} reviews", current, board.reviews.len());
            }
            for review in &board.reviews {
                let mine = if app.reviews.can_delete(&board, review) { " (yours)" } else { "" };
                println!("{}\t{}/5\t{}{}\t{}", review.id, review.rating, review.username, mine, review.comment);
            }
        }
        Command::Route {
            from_lat,
            from_lon,
            to_lat,
            to_lon,
        } => {
            let points = app
                .routes
                .route(Coordinates::new(from_lat, from_lon), Coordinates::new(to_lat, to_lon))
                .await
                .context("Error calculating route")?;
            println!("{}", serde_json::to_string(&points)?);
        }
        Command::Login { email, password } => {
            let user = app.session.login(&email, &password).await.context("Login failed")?;
            println!("Welcome back, {}", user.name);
        }
        Command::Logout => {
            app.session.logout().await;
            println!("Signed out");
        }
        Command::Chat { message, route } => {
            if !route.is_empty() {
                let plan = app
                    .chatbot
                    .create_route(&route, None)
                    .await
                    .context("Error creating route")?;
                for stop in &plan.stops {
                    println!("{}. {} ({:.0}m)", stop.order, stop.name, stop.distance_from_previous);
                }
            }
            if let Some(message) = message {
                let reply = tokio::select! {
                    reply = app.chatbot.send_message(&message) => reply.context("Chat request failed")?,
                    _ = tokio::signal::ctrl_c() => {
                        app.chatbot.cancel();
                        return Ok(());
                    }
                };
                println!("{}", reply.bot_response);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn province_flag_is_kept_alongside_coordinates() {
        let request = search_request(None, Some("Da Nang".to_string()), Some((10.7, 106.7)), None);
        assert_eq!(request.province_id.as_deref(), Some("Da Nang"));
        assert_eq!(request.user_location, Some(Coordinates::new(10.7, 106.7)));
    }

    #[test]
    fn bare_coordinates_search_near_me() {
        let request = search_request(Some("bún chả".to_string()), None, Some((21.0, 105.8)), None);
        assert_eq!(request.province_id.as_deref(), Some(NEAR_ME));
        assert_eq!(request.radius, None);
    }
}
