use std::sync::Arc;

use async_trait::async_trait;
use rm_domain::{IpAddress, IpState, IpStatus, TenantId};
use rm_inventory::{FieldMask, InventoryGateway};
use tracing::debug;

use crate::fabric::{handle_inventory_error, Directive, Reconcile, ResweepSource};

/// The reconciler fabric's canonical instance (§4.D.1): converges an IP
/// address's `current_state`/`status` toward its `desired_state`, refusing
/// to converge addresses that collide with another holder in the same
/// site.
pub struct IpReconciler<G: InventoryGateway> {
    inventory: Arc<G>,
}

impl<G: InventoryGateway> IpReconciler<G> {
    pub fn new(inventory: Arc<G>) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl<G: InventoryGateway> Reconcile for IpReconciler<G> {
    async fn reconcile(&self, tenant: &TenantId, resource_id: &str) -> Directive {
        let ip_id = rm_domain::IpAddressId::new(resource_id);
        let ip = match self.inventory.get_ip_address(tenant, &ip_id).await {
            Ok(ip) => ip,
            Err(err) => return handle_inventory_error(&err),
        };

        if ip.desired_state == ip.current_state {
            return Directive::Ack;
        }

        let target = if ip.address.is_none() {
            address_unsupported(&ip)
        } else {
            let siblings = match &ip.nic.site_id {
                Some(site_id) => self.inventory.list_ip_addresses_by_site(tenant, site_id).await,
                None => self.inventory.list_ip_addresses_unsited(tenant).await,
            };
            let siblings = match siblings {
                Ok(s) => s,
                Err(err) => return handle_inventory_error(&err),
            };
            let group_size = duplicate_count(&ip, &siblings);
            if group_size == 0 {
                debug!(tenant = %tenant, ip = %ip.ip_id, "no sibling holders found for address, deferring to next resweep");
                return Directive::Ack;
            }
            converge(&ip, group_size)
        };

        if is_converged(&ip, &target) {
            return Directive::Ack;
        }

        match self
            .inventory
            .update_ip_address(
                tenant,
                &target,
                FieldMask::new(&["status", "status_detail", "current_state"]),
            )
            .await
        {
            Ok(_) => Directive::Ack,
            Err(err) => handle_inventory_error(&err),
        }
    }
}

#[async_trait]
impl<G: InventoryGateway> ResweepSource for IpReconciler<G> {
    async fn list_ids(&self, tenant: &TenantId) -> Result<Vec<String>, rm_inventory::InventoryError> {
        let all = self.inventory.list_ip_addresses_all(tenant).await?;
        Ok(all.into_iter().map(|ip| ip.ip_id.to_string()).collect())
    }
}

/// How many addresses in `siblings` (which should include `target` itself,
/// since `target` always matches its own address/site) share `target`'s
/// address. A count of `1` means `target` is the address's sole holder.
pub fn duplicate_count(target: &IpAddress, siblings: &[IpAddress]) -> usize {
    let Some(addr) = &target.address else { return 0 };
    siblings
        .iter()
        .filter(|s| s.address.as_deref() == Some(addr.as_str()))
        .count()
}

fn address_unsupported(ip: &IpAddress) -> IpAddress {
    let mut out = ip.clone();
    out.status = IpStatus::AssignmentError;
    out.current_state = IpState::Error;
    out.status_detail = Some("IPAddress assignment is unsupported".to_string());
    out
}

/// Pure convergence step given the total number of holders (including
/// `ip` itself) of `ip`'s address within its site, independent of
/// inventory I/O so the state transitions can be tested directly (§4.D.1,
/// §8 property 7).
pub fn converge(ip: &IpAddress, group_size: usize) -> IpAddress {
    let mut out = ip.clone();
    if group_size > 1 {
        out.status = IpStatus::ConfigurationError;
        out.current_state = IpState::Error;
        out.status_detail =
            Some(format!("address held by {group_size} resources in the same site"));
    } else {
        out.status = IpStatus::Configured;
        out.current_state = IpState::Configured;
        out.status_detail = None;
    }
    out
}

fn is_converged(before: &IpAddress, after: &IpAddress) -> bool {
    before.current_state == after.current_state
        && before.status == after.status
        && before.status_detail == after.status_detail
}

#[cfg(test)]
mod tests {
    use super::*;
    use rm_domain::{HostId, IpAddressId, IpConfigMethod, NicId, NicRef, SiteId};

    fn ip(id: &str, address: Option<&str>, site: Option<&str>, desired: IpState) -> IpAddress {
        IpAddress {
            ip_id: IpAddressId::new(id),
            tenant_id: TenantId::new("t1"),
            address: address.map(str::to_string),
            config_method: IpConfigMethod::Static,
            nic: NicRef {
                nic_id: NicId::new(format!("{id}-nic")),
                host_id: HostId::new(format!("{id}-host")),
                site_id: site.map(SiteId::new),
            },
            current_state: IpState::Unspecified,
            desired_state: desired,
            status: IpStatus::Unspecified,
            status_detail: None,
        }
    }

    #[test]
    fn sole_holder_converges_to_configured() {
        let target = ip("ip1", Some("10.0.0.5"), Some("site-a"), IpState::Configured);
        let siblings = vec![target.clone()];
        let group_size = duplicate_count(&target, &siblings);
        assert_eq!(group_size, 1);
        let converged = converge(&target, group_size);
        assert_eq!(converged.status, IpStatus::Configured);
        assert_eq!(converged.current_state, IpState::Configured);
    }

    #[test]
    fn two_holders_produce_configuration_error_for_s5_style_group() {
        let target = ip("ip1", Some("10.0.0.5"), Some("site-a"), IpState::Configured);
        let other = ip("ip2", Some("10.0.0.5"), Some("site-a"), IpState::Configured);
        let siblings = vec![target.clone(), other];
        let group_size = duplicate_count(&target, &siblings);
        assert_eq!(group_size, 2);
        let converged = converge(&target, group_size);
        assert_eq!(converged.status, IpStatus::ConfigurationError);
        assert_eq!(converged.current_state, IpState::Error);
    }

    #[test]
    fn empty_address_is_assignment_error_scenario_s5() {
        let target = ip("ip1", None, Some("site-a"), IpState::Configured);
        let converged = address_unsupported(&target);
        assert_eq!(converged.status, IpStatus::AssignmentError);
        assert_eq!(converged.current_state, IpState::Error);
    }

    #[test]
    fn already_converged_is_idempotent() {
        let mut target = ip("ip1", Some("10.0.0.5"), Some("site-a"), IpState::Configured);
        target.current_state = IpState::Configured;
        target.status = IpStatus::Configured;
        let converged = converge(&target, 1);
        assert!(is_converged(&target, &converged));
    }
}
