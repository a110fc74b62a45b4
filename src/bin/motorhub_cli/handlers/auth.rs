#![deny(clippy::all, clippy::pedantic)]

use motorhub_api_types::LoginData;

use crate::args::LoginArgs;
use crate::client::{CliError, Ctx};
use crate::io::read_value;
use crate::print::print_json;

pub async fn login(ctx: &Ctx, args: LoginArgs) -> Result<(), CliError> {
    let password = read_value(args.password_env, args.password_file, "password")?;
    let user = ctx
        .hub
        .login(&LoginData {
            email: args.email,
            password,
        })
        .await?;
    print_json(&user)
}

pub async fn logout(ctx: &Ctx) -> Result<(), CliError> {
    ctx.hub.logout().await?;
    print_json(&serde_json::json!({ "message": "Logged out" }))
}

pub async fn me(ctx: &Ctx) -> Result<(), CliError> {
    ctx.signed_in().await?;
    let user = ctx.hub.me().await?;
    print_json(user.as_ref())
}
