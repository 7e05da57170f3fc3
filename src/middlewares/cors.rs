use actix_cors::Cors;

pub fn create_cors() -> Cors {
    Cors::default()
        .allowed_origin_fn(|_, _req_head| {
            // tighten to the storefront origin when deployed behind one
            true
        })
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_any_header()
        // session cookie travels with cross-origin requests
        .supports_credentials()
        .max_age(3600)
}
