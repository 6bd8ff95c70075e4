use actix_web::web::{scope, ServiceConfig};
use actix_web::Scope;

use access::{
    allow_download, allow_read, find_access, pending_requests, request_download, request_read,
};
use files::{delete_file, download_file, get_all_files, upload_file};
use users::{activate, get_all_users, login, register};

mod access;
mod files;
mod health_check;
mod users;

use crate::routes::health_check::*;

fn users_routes() -> Scope {
    scope("users")
        .service(register)
        .service(login)
        .service(activate)
        .service(get_all_users)
}

fn access_routes() -> Scope {
    scope("access")
        .service(pending_requests)
        .service(request_read)
        .service(request_download)
        .service(allow_read)
        .service(allow_download)
        .service(find_access)
}

fn files_routes() -> Scope {
    scope("files")
        .service(get_all_files)
        .service(upload_file)
        .service(download_file)
        .service(delete_file)
}

fn util_routes() -> Scope {
    scope("").service(health_check)
}

pub fn fileshare_routes(conf: &mut ServiceConfig) {
    conf.service(
        scope("api/v1")
            .service(users_routes())
            .service(access_routes())
            .service(files_routes())
            .service(util_routes()),
    );
}
