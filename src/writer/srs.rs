/// A row of `gpkg_spatial_ref_sys`
pub struct SpatialRefSys<'a> {
    pub name: &'a str,
    pub id: i32,
    pub organization: &'a str,
    pub organization_coordsys_id: i32,
    pub definition: &'a str,
    pub description: &'a str,
}

pub const CARTESIAN: SpatialRefSys = SpatialRefSys {
    name: "Undefined cartesian SRS",
    id: -1,
    organization: "NONE",
    organization_coordsys_id: -1,
    definition: "undefined",
    description: "undefined cartesian coordinate reference system",
};

pub const GEOGRAPHIC: SpatialRefSys = SpatialRefSys {
    name: "Undefined geographic SRS",
    id: 0,
    organization: "NONE",
    organization_coordsys_id: 0,
    definition: "undefined",
    description: "undefined geographic coordinate reference system",
};

pub const WGS84: SpatialRefSys = SpatialRefSys {
    name: "WGS 84 geodetic",
    id: 4326,
    organization: "EPSG",
    organization_coordsys_id: 4326,
    definition: "GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",SPHEROID[\"WGS 84\",6378137,298.257223563,AUTHORITY[\"EPSG\",\"7030\"]],AUTHORITY[\"EPSG\",\"6326\"]],PRIMEM[\"Greenwich\",0,AUTHORITY[\"EPSG\",\"8901\"]],UNIT[\"degree\",0.0174532925199433,AUTHORITY[\"EPSG\",\"9122\"]],AXIS[\"Latitude\",NORTH],AXIS[\"Longitude\",EAST],AUTHORITY[\"EPSG\",\"4326\"]]",
    description: "longitude/latitude coordinates in decimal degrees on the WGS 84 spheroid",
};

pub const ETRS_TM35FIN: SpatialRefSys = SpatialRefSys {
    name: "ETRS89 / TM35FIN(E,N)",
    id: 3067,
    organization: "EPSG",
    organization_coordsys_id: 3067,
    definition: "PROJCS[\"ETRS89 / TM35FIN(E,N)\",GEOGCS[\"ETRS89\",DATUM[\"European_Terrestrial_Reference_System_1989\",SPHEROID[\"GRS 1980\",6378137,298.257222101,AUTHORITY[\"EPSG\",\"7019\"]],TOWGS84[0,0,0,0,0,0,0],AUTHORITY[\"EPSG\",\"6258\"]],PRIMEM[\"Greenwich\",0,AUTHORITY[\"EPSG\",\"8901\"]],UNIT[\"degree\",0.0174532925199433,AUTHORITY[\"EPSG\",\"9122\"]],AUTHORITY[\"EPSG\",\"4258\"]],PROJECTION[\"Transverse_Mercator\"],PARAMETER[\"latitude_of_origin\",0],PARAMETER[\"central_meridian\",27],PARAMETER[\"scale_factor\",0.9996],PARAMETER[\"false_easting\",500000],PARAMETER[\"false_northing\",0],UNIT[\"metre\",1,AUTHORITY[\"EPSG\",\"9001\"]],AXIS[\"Easting\",EAST],AXIS[\"Northing\",NORTH],AUTHORITY[\"EPSG\",\"3067\"]]",
    description: "Finnish national grid, ETRS-TM35FIN",
};

/// Reference systems every written GeoPackage carries
pub const REQUIRED: &[SpatialRefSys] = &[CARTESIAN, GEOGRAPHIC, WGS84, ETRS_TM35FIN];
