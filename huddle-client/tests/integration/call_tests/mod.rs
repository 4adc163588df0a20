mod test_ice_exchange;
mod test_media_changes;
mod test_three_party_mesh;
mod test_two_party_call;
