#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod auto_ingress;
mod ingress;
mod service;

pub use self::{
    auto_ingress::{AutoIngress, AutoIngressSpec},
    ingress::{ingress, route_record},
    service::service_descriptor,
};
pub use k8s_openapi::api::{
    core::v1::{Service, ServicePort, ServiceSpec},
    networking::v1::Ingress,
};
pub use kube::{
    api::{Api, DeleteParams, ListParams, ObjectMeta, PostParams, ResourceExt},
    Client, CustomResourceExt, Error,
};
